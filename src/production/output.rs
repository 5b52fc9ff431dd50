//! Output tree produced from snippets

use std::collections::BTreeMap;

use quick_xml::escape::{escape, partial_escape};

use crate::data::{Callback, CallbackError, Data};

/// Namespace bound to the reserved `xml` prefix
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An attribute of an output element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAttribute {
    pub namespace: Option<String>,
    /// Preferred prefix for namespaced attributes when serializing; one is
    /// generated when missing
    pub prefix: Option<String>,
    pub name: String,
    pub value: String,
}

impl OutputAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A node of the output tree
#[derive(Debug, Clone, PartialEq)]
pub enum OutputNode {
    Element(OutputElement),
    Text(String),
}

impl OutputNode {
    pub fn as_element(&self) -> Option<&OutputElement> {
        match self {
            OutputNode::Element(e) => Some(e),
            OutputNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutputNode::Text(t) => Some(t),
            OutputNode::Element(_) => None,
        }
    }
}

impl From<OutputElement> for OutputNode {
    fn from(element: OutputElement) -> Self {
        OutputNode::Element(element)
    }
}

/// An element of the output tree.
///
/// Besides attributes and children an element can carry event handlers,
/// installed from `on*` directive attributes. Handlers are not attributes:
/// they are invoked with [`OutputElement::trigger`] and never serialized.
#[derive(Debug, Clone)]
pub struct OutputElement {
    pub namespace: String,
    pub name: String,
    pub attributes: Vec<OutputAttribute>,
    pub children: Vec<OutputNode>,
    handlers: BTreeMap<String, Callback>,
}

impl OutputElement {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            handlers: BTreeMap::new(),
        }
    }

    /// Set an attribute, replacing one with the same namespace and name
    pub fn set_attribute(&mut self, attribute: OutputAttribute) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name == attribute.name && a.namespace == attribute.namespace)
        {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Value of an attribute without namespace
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_ns(None, name)
    }

    pub fn attribute_ns(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<OutputAttribute> {
        let pos = self
            .attributes
            .iter()
            .position(|a| a.name == name && a.namespace.is_none())?;
        Some(self.attributes.remove(pos))
    }

    pub fn append_child(&mut self, child: impl Into<OutputNode>) {
        self.children.push(child.into());
    }

    pub fn append_text(&mut self, text: impl Into<String>) {
        self.children.push(OutputNode::Text(text.into()));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &OutputElement> {
        self.children.iter().filter_map(OutputNode::as_element)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text
    }

    /// Install an event handler under its binding name, e.g. `onclick`
    pub fn set_handler(&mut self, name: impl Into<String>, handler: Callback) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn handler(&self, name: &str) -> Option<&Callback> {
        self.handlers.get(name)
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|k| k.as_str())
    }

    /// Invoke the handler installed under `name` on this element.
    /// Returns `false` when no such handler is installed.
    pub fn trigger(&mut self, name: &str, data: &Data) -> Result<bool, CallbackError> {
        let Some(handler) = self.handlers.get(name).cloned() else {
            return Ok(false);
        };
        handler.call(self, data)?;
        Ok(true)
    }

    /// Serialize the tree as XML. Namespaces are declared on the root and
    /// wherever an element's namespace differs from its parent's.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_element(self, None, &mut out);
        out
    }
}

impl PartialEq for OutputElement {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.name == other.name
            && self.attributes == other.attributes
            && self.children == other.children
            && self.handlers.keys().eq(other.handlers.keys())
    }
}

fn collect_text(element: &OutputElement, out: &mut String) {
    for child in &element.children {
        match child {
            OutputNode::Text(t) => out.push_str(t),
            OutputNode::Element(e) => collect_text(e, out),
        }
    }
}

fn write_element(element: &OutputElement, parent_namespace: Option<&str>, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    if parent_namespace != Some(element.namespace.as_str()) {
        out.push_str(&format!(" xmlns=\"{}\"", escape(element.namespace.as_str())));
    }

    // (prefix, namespace) pairs declared on this element
    let mut declared: Vec<(String, &str)> = Vec::new();
    let mut attributes = Vec::with_capacity(element.attributes.len());
    for attr in &element.attributes {
        let name = match attr.namespace.as_deref() {
            None => attr.name.clone(),
            Some(XML_NAMESPACE) => format!("xml:{}", attr.name),
            Some(ns) => {
                let prefix = match declared.iter().find(|(_, uri)| *uri == ns) {
                    Some((prefix, _)) => prefix.clone(),
                    None => {
                        let prefix = declare_prefix(attr.prefix.as_deref(), &declared);
                        out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(ns)));
                        declared.push((prefix.clone(), ns));
                        prefix
                    }
                };
                format!("{}:{}", prefix, attr.name)
            }
        };
        attributes.push((name, attr.value.as_str()));
    }
    for (name, value) in attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            OutputNode::Text(t) => out.push_str(&partial_escape(t.as_str())),
            OutputNode::Element(e) => write_element(e, Some(&element.namespace), out),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// The preferred prefix if it is still free, otherwise the first free `nsN`
fn declare_prefix(preferred: Option<&str>, declared: &[(String, &str)]) -> String {
    let taken = |p: &str| p == "xml" || p == "xmlns" || declared.iter().any(|(q, _)| q == p);
    if let Some(prefix) = preferred.filter(|p| !p.is_empty() && !taken(p)) {
        return prefix.to_string();
    }
    (0..)
        .map(|n| format!("ns{}", n))
        .find(|p| !taken(p.as_str()))
        .unwrap_or_default()
}
