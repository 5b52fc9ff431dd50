//! Origin trails and validation warnings
//!
//! Every diagnostic carries the trail of source elements that led to it:
//! one frame per opening tag, from the outermost snippet down to the node at
//! fault, each tagged with the source it came from.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::markup::Element;

/// One step of an origin trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginFrame {
    /// Opening tag of the source element, without namespace declarations
    pub tag: String,
    /// Where the element came from, e.g. `templates/page.xml:/nav/item`
    pub location: String,
}

impl fmt::Display for OriginFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t@{}", self.tag, self.location)
    }
}

#[derive(Debug)]
struct OriginLink {
    frame: OriginFrame,
    parent: Option<Arc<OriginLink>>,
}

/// Persistent, cheaply cloned origin trail under construction.
///
/// Extending returns a new trail; the receiver is left as it was, so sibling
/// branches never see each other's frames.
#[derive(Debug, Clone, Default)]
pub struct Origin(Option<Arc<OriginLink>>);

impl Origin {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&self, frame: OriginFrame) -> Origin {
        Origin(Some(Arc::new(OriginLink {
            frame,
            parent: self.0.clone(),
        })))
    }

    /// Extend the trail with a source element
    pub fn enter(&self, element: &Element, location: &str) -> Origin {
        self.push(OriginFrame {
            tag: element.opening_tag(),
            location: location.to_string(),
        })
    }

    /// Snapshot of the trail, outermost frame first
    pub fn trail(&self) -> OriginTrail {
        let mut frames = Vec::new();
        let mut link = self.0.as_deref();
        while let Some(l) = link {
            frames.push(l.frame.clone());
            link = l.parent.as_deref();
        }
        frames.reverse();
        OriginTrail(frames)
    }
}

/// Owned origin trail attached to errors and warnings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginTrail(pub Vec<OriginFrame>);

impl OriginTrail {
    pub fn frames(&self) -> &[OriginFrame] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The innermost frame, i.e. the node at fault
    pub fn last(&self) -> Option<&OriginFrame> {
        self.0.last()
    }
}

impl fmt::Display for OriginTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}{}", "  ".repeat(i), frame)?;
        }
        Ok(())
    }
}

/// Category of a validation warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Element outside the directive namespace where only directives belong
    UnexpectedElement,
    /// Directive element in a place it is not allowed
    ElementNotAllowed,
    /// Directive attribute that is not allowed on this element
    AttributeNotAllowed,
    /// Required attribute is absent
    MissingAttribute,
    /// Snippet definition with more than one child element
    MultipleRootElements,
    /// Snippet definition without any child element
    EmptySnippet,
    /// `choose` mode other than `strict` or `lax`
    InvalidChooseMode,
    /// Event binding that does not name a callable
    HandlerNotCallable,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::UnexpectedElement => write!(f, "unexpected-element"),
            WarningKind::ElementNotAllowed => write!(f, "element-not-allowed"),
            WarningKind::AttributeNotAllowed => write!(f, "attribute-not-allowed"),
            WarningKind::MissingAttribute => write!(f, "missing-attribute"),
            WarningKind::MultipleRootElements => write!(f, "multiple-root-elements"),
            WarningKind::EmptySnippet => write!(f, "empty-snippet"),
            WarningKind::InvalidChooseMode => write!(f, "invalid-choose-mode"),
            WarningKind::HandlerNotCallable => write!(f, "handler-not-callable"),
        }
    }
}

/// A non-fatal problem found while loading or producing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub message: String,
    pub origin: OriginTrail,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.message, self.origin)
    }
}

/// Collects warnings and logs each one as it is raised
#[derive(Debug, Default)]
pub struct Warnings(Vec<ValidationWarning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, kind: WarningKind, message: impl Into<String>, origin: &Origin) {
        let warning = ValidationWarning {
            kind,
            message: message.into(),
            origin: origin.trail(),
        };
        warn!(kind = %warning.kind, "{}", warning);
        self.0.push(warning);
    }

    pub fn into_vec(self) -> Vec<ValidationWarning> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: &str) -> OriginFrame {
        OriginFrame {
            tag: tag.to_string(),
            location: "a.xml:/x".to_string(),
        }
    }

    #[test]
    fn test_trail_is_outermost_first() {
        let origin = Origin::root().push(frame("<div>")).push(frame("<p>"));
        let trail = origin.trail();
        assert_eq!(trail.frames().len(), 2);
        assert_eq!(trail.frames()[0].tag, "<div>");
        assert_eq!(trail.last().map(|f| f.tag.as_str()), Some("<p>"));
    }

    #[test]
    fn test_push_leaves_parent_untouched() {
        let parent = Origin::root().push(frame("<div>"));
        let _left = parent.push(frame("<a>"));
        let right = parent.push(frame("<b>"));

        assert_eq!(parent.trail().frames().len(), 1);
        let tags: Vec<_> = right.trail().0.into_iter().map(|f| f.tag).collect();
        assert_eq!(tags, vec!["<div>", "<b>"]);
    }

    #[test]
    fn test_trail_display() {
        let trail = Origin::root().push(frame("<div>")).push(frame("<p>")).trail();
        assert_eq!(trail.to_string(), "<div>\t@a.xml:/x\n  <p>\t@a.xml:/x");
    }
}
