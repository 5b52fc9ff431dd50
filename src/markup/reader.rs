//! XML reader building template trees with quick-xml

use std::io::Cursor;

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

use super::node::{Attribute, Element, TemplateNode};

/// Errors raised while reading markup
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("invalid UTF-8 in XML: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("closing tag without matching opening tag")]
    UnbalancedTags,

    #[error("document has no root element")]
    NoRootElement,

    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    #[error("content after the root element")]
    TrailingContent,
}

/// Parse XML text into the tree of its root element.
///
/// Text is kept verbatim, whitespace included. Comments, processing
/// instructions and declarations are dropped.
pub fn parse(input: &str) -> Result<Element, MarkupError> {
    let mut reader = NsReader::from_reader(Cursor::new(input.as_bytes()));
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        buf.clear();
        let (resolve, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| MarkupError::Parse(e.to_string()))?;
        let namespace = resolve_namespace(resolve);

        match event {
            Event::Start(ref e) => {
                let element = read_element(&reader, e, namespace)?;
                if root.is_some() {
                    return Err(MarkupError::TrailingContent);
                }
                stack.push(element);
            }
            Event::Empty(ref e) => {
                let element = read_element(&reader, e, namespace)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(MarkupError::UnbalancedTags)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|e| MarkupError::Parse(e.to_string()))?;
                push_text(&mut stack, &text);
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                push_text(&mut stack, text);
            }
            Event::GeneralRef(e) => {
                let raw = e.decode().map_err(|e| MarkupError::Parse(e.to_string()))?;
                let resolved = resolve_entity(&raw)?;
                push_text(&mut stack, &resolved);
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => {
                if let Some(open) = stack.last() {
                    return Err(MarkupError::UnexpectedEof(open.qualified_name()));
                }
                return root.ok_or(MarkupError::NoRootElement);
            }
        }
    }
}

fn read_element(
    reader: &NsReader<Cursor<&[u8]>>,
    start: &BytesStart<'_>,
    namespace: Option<String>,
) -> Result<Element, MarkupError> {
    let local = std::str::from_utf8(start.local_name().into_inner())?.to_string();
    let prefix = match start.name().prefix() {
        Some(p) => Some(std::str::from_utf8(p.into_inner())?.to_string()),
        None => None,
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| MarkupError::Parse(e.to_string()))?;
        let key = attr.key;

        // namespace declarations are consumed by the resolver
        if key.as_ref() == b"xmlns" {
            continue;
        }
        if let Some(p) = key.prefix() {
            if p.as_ref() == b"xmlns" {
                continue;
            }
        }

        let (attr_resolve, _) = reader.resolver().resolve_attribute(key);
        let attr_prefix = match key.prefix() {
            Some(p) => Some(std::str::from_utf8(p.into_inner())?.to_string()),
            None => None,
        };
        let name = std::str::from_utf8(key.local_name().into_inner())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| MarkupError::Parse(e.to_string()))?
            .into_owned();

        attributes.push(Attribute {
            namespace: resolve_namespace(attr_resolve),
            prefix: attr_prefix,
            name,
            value,
        });
    }

    Ok(Element {
        namespace,
        prefix,
        name: local,
        attributes,
        children: Vec::new(),
    })
}

fn close(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), MarkupError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(TemplateNode::Element(element)),
        None => {
            if root.is_some() {
                return Err(MarkupError::TrailingContent);
            }
            *root = Some(element);
        }
    }
    Ok(())
}

/// Append text to the open element, merging with a preceding text node.
/// Text outside the root element is ignored.
fn push_text(stack: &mut [Element], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(TemplateNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(TemplateNode::Text(text.to_string()));
    }
}

fn resolve_namespace(resolve: ResolveResult<'_>) -> Option<String> {
    match resolve {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn resolve_entity(raw: &str) -> Result<String, MarkupError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.into());
    }

    if let Some(rest) = raw.strip_prefix('#') {
        let code = if let Some(hex) = rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            u32::from_str_radix(hex, 16)
                .map_err(|_| MarkupError::Parse(format!("invalid hex entity: #{}", rest)))?
        } else {
            rest.parse::<u32>()
                .map_err(|_| MarkupError::Parse(format!("invalid decimal entity: #{}", rest)))?
        };
        let ch = char::from_u32(code)
            .ok_or_else(|| MarkupError::Parse(format!("invalid code point: {}", code)))?;
        return Ok(ch.to_string());
    }

    Ok(format!("&{};", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS: &str = "https://github.com/suppenhuhn79/pagesnippets";

    #[test]
    fn test_parse_resolves_namespaces() {
        let root = parse(
            r#"<ps:pagesnippets xmlns:ps="https://github.com/suppenhuhn79/pagesnippets">
                <ps:snippet name="greet"><p class="x">Hi</p></ps:snippet>
            </ps:pagesnippets>"#,
        )
        .expect("Should parse");

        assert_eq!(root.name, "pagesnippets");
        assert!(root.is_in(PS));
        let snippet = root.child_elements().next().expect("snippet element");
        assert_eq!(snippet.prefix.as_deref(), Some("ps"));
        assert_eq!(snippet.attribute("name"), Some("greet"));
        let p = snippet.child_elements().next().expect("p element");
        assert_eq!(p.namespace, None);
        assert_eq!(p.attribute("class"), Some("x"));
        assert_eq!(p.children, vec![TemplateNode::Text("Hi".to_string())]);
    }

    #[test]
    fn test_parse_drops_namespace_declarations() {
        let root = parse(r#"<a xmlns="urn:x" xmlns:ps="urn:ps" ps:onclick="f" id="1"/>"#)
            .expect("Should parse");

        assert_eq!(root.namespace.as_deref(), Some("urn:x"));
        assert_eq!(root.attributes.len(), 2);
        assert_eq!(root.attribute_ns(Some("urn:ps"), "onclick"), Some("f"));
        // default namespaces do not apply to attributes
        assert_eq!(root.attribute("id"), Some("1"));
    }

    #[test]
    fn test_parse_merges_text_and_entities() {
        let root = parse("<p>Fish &amp; chips &#x21;</p>").expect("Should parse");
        assert_eq!(
            root.children,
            vec![TemplateNode::Text("Fish & chips !".to_string())]
        );
    }

    #[test]
    fn test_parse_keeps_whitespace_text() {
        let root = parse("<p><b>a</b> <b>b</b></p>").expect("Should parse");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[1], TemplateNode::Text(" ".to_string()));
    }

    #[test]
    fn test_parse_cdata_is_text() {
        let root = parse("<p><![CDATA[a < b]]></p>").expect("Should parse");
        assert_eq!(root.children, vec![TemplateNode::Text("a < b".to_string())]);
    }

    #[test]
    fn test_parse_empty_document_error() {
        assert!(matches!(parse(""), Err(MarkupError::NoRootElement)));
    }

    #[test]
    fn test_parse_unclosed_element_error() {
        assert!(parse("<a><b></b>").is_err());
    }
}
