//! Variable resolution: dot-path lookup and `{{ path }}` substitution

use tracing::info;

use crate::data::{Data, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Look up a dot-separated path in a data record.
///
/// Returns `None` when a segment is missing or an intermediate value is not
/// a record.
pub fn resolve_path<'a>(data: &'a Data, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = data.get(first)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

/// A placeholder occurrence found in a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'t> {
    /// Byte range of the whole `{{...}}` occurrence
    pub range: std::ops::Range<usize>,
    /// The path between the braces, trimmed
    pub path: &'t str,
}

/// Find all placeholders, left to right. An opening `{{` without a closing
/// `}}` is left as plain text.
pub fn placeholders(text: &str) -> Vec<Placeholder<'_>> {
    let mut found = Vec::new();
    let mut offset = 0;
    while let Some(start) = text[offset..].find(OPEN) {
        let start = offset + start;
        let inner = start + OPEN.len();
        let Some(len) = text[inner..].find(CLOSE) else {
            break;
        };
        let end = inner + len + CLOSE.len();
        found.push(Placeholder {
            range: start..end,
            path: text[inner..inner + len].trim(),
        });
        offset = end;
    }
    found
}

/// If `text` is exactly one placeholder (surrounding whitespace aside),
/// return its path.
pub fn sole_placeholder(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    match placeholders(trimmed).as_slice() {
        [only] if only.range == (0..trimmed.len()) => Some(only.path),
        _ => None,
    }
}

/// Replace every placeholder in `text` with the text of the value its path
/// resolves to. Unresolved paths become the empty string.
pub fn substitute(text: &str, data: &Data) -> String {
    let found = placeholders(text);
    if found.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for placeholder in found {
        result.push_str(&text[last..placeholder.range.start]);
        match resolve_path(data, placeholder.path) {
            Some(value) => result.push_str(&value.to_text()),
            None => info!(path = placeholder.path, "no data for placeholder"),
        }
        last = placeholder.range.end;
    }
    result.push_str(&text[last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Data {
        Data::new()
            .with("a", Data::new().with("b", "X").with("n", 7))
            .with("name", "Ada")
    }

    #[test]
    fn test_resolve_path_nested() {
        let data = sample();
        assert_eq!(resolve_path(&data, "a.b"), Some(&Value::from("X")));
        assert_eq!(resolve_path(&data, " name "), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_resolve_path_missing_segment() {
        let data = sample();
        assert_eq!(resolve_path(&data, "a.c"), None);
        assert_eq!(resolve_path(&data, "name.first"), None);
        assert_eq!(resolve_path(&data, ""), None);
    }

    #[test]
    fn test_substitute_single() {
        assert_eq!(substitute("{{a.b}}!", &sample()), "X!");
    }

    #[test]
    fn test_substitute_missing_is_empty() {
        assert_eq!(substitute("[{{a.c}}]", &sample()), "[]");
    }

    #[test]
    fn test_substitute_multiple_left_to_right() {
        assert_eq!(
            substitute("{{ name }} has {{a.n}} and {{name}}", &sample()),
            "Ada has 7 and Ada"
        );
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let data = Data::new().with("x", "{{y}}").with("y", "nope");
        assert_eq!(substitute("{{x}}", &data), "{{y}}");
    }

    #[test]
    fn test_unterminated_placeholder_is_text() {
        assert_eq!(substitute("a {{ b", &sample()), "a {{ b");
    }

    #[test]
    fn test_sole_placeholder() {
        assert_eq!(sole_placeholder(" {{ a.b }} "), Some("a.b"));
        assert_eq!(sole_placeholder("x{{a}}"), None);
        assert_eq!(sole_placeholder("{{a}}{{b}}"), None);
    }
}
