//! Markup model for template sources
//!
//! Templates are read into a small namespace-aware tree of elements and text
//! nodes. The loader and the production engine only ever see this tree, so
//! hosts with their own XML stack can build it directly instead of going
//! through [`parse`].

mod node;
mod reader;

pub use node::{Attribute, Element, TemplateNode};
pub use reader::{parse, MarkupError};
