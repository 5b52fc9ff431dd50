//! Recursive production of snippets into output trees
//!
//! Production walks a snippet's template tree depth-first. Plain elements
//! are copied with their attributes substituted; directive elements are
//! interpreted against the data in scope. `insert-snippet` recurses into
//! another snippet with the same data and an extended call chain, which is
//! how self-nesting is detected.

use tracing::debug;

use crate::config::EngineConfig;
use crate::data::{Data, Value};
use crate::diagnostics::{Origin, ValidationWarning, WarningKind, Warnings};
use crate::error::ExpressionError;
use crate::expr::TestExpression;
use crate::markup::{Element, TemplateNode};
use crate::template::{SnippetKey, SnippetRegistry};
use crate::variables::{resolve_path, substitute};

use super::directive::{ChooseMode, Directive};
use super::error::{CallableRole, ProduceError};
use super::output::{OutputAttribute, OutputElement};

/// Stack of active snippet productions, as `source:key` tokens.
///
/// Extending returns a new chain; sibling branches never share frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallChain(Vec<String>);

impl CallChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn extended(&self, token: impl Into<String>) -> CallChain {
        let mut tokens = self.0.clone();
        tokens.push(token.into());
        CallChain(tokens)
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

/// Output of a production together with the warnings raised on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub output: OutputElement,
    pub warnings: Vec<ValidationWarning>,
}

/// Produce the snippet stored under `key` with the given data
pub fn produce(
    registry: &SnippetRegistry,
    config: &EngineConfig,
    key: impl Into<SnippetKey>,
    data: &Data,
) -> Result<Production, ProduceError> {
    let mut producer = Producer {
        registry,
        config,
        warnings: Warnings::new(),
    };
    let output =
        producer.produce_with_chain(&key.into(), data, &CallChain::new(), &Origin::root())?;
    Ok(Production {
        output,
        warnings: producer.warnings.into_vec(),
    })
}

/// Per-snippet state shared by the nodes of one template
struct Frame<'f> {
    /// `source:key` of the snippet, the location of every node in it
    location: &'f str,
    chain: &'f CallChain,
}

struct Producer<'a> {
    registry: &'a SnippetRegistry,
    config: &'a EngineConfig,
    warnings: Warnings,
}

impl Producer<'_> {
    fn directive_ns(&self) -> &str {
        &self.config.directive_namespace
    }

    fn produce_with_chain(
        &mut self,
        key: &SnippetKey,
        data: &Data,
        chain: &CallChain,
        origin: &Origin,
    ) -> Result<OutputElement, ProduceError> {
        let record = self.registry.get(key).map_err(|_| ProduceError::NotFound {
            key: key.clone(),
            origin: origin.trail(),
        })?;

        let token = record.token();
        if chain.contains(&token) {
            return Err(ProduceError::Recursion {
                key: key.clone(),
                chain: chain.extended(token).0,
                origin: origin.trail(),
            });
        }
        debug!(key = %key, depth = chain.tokens().len(), "producing snippet");
        let chain = chain.extended(token.as_str());
        let origin = origin.enter(&record.template, &token);
        let frame = Frame {
            location: &token,
            chain: &chain,
        };

        let mut target =
            OutputElement::new(record.namespace.as_str(), record.template.name.as_str());
        self.process_attributes(&record.template, &mut target, data, &origin);
        self.process_children(&record.template, &mut target, data, &frame, &origin)?;
        self.postproduction(&record.template, &mut target, data, &origin)?;
        Ok(target)
    }

    fn process_children(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        frame: &Frame<'_>,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        for child in &node.children {
            match child {
                TemplateNode::Text(text) => {
                    if !text.trim().is_empty() {
                        target.append_text(substitute(text, data));
                    }
                }
                TemplateNode::Element(element) => {
                    let location = origin.enter(element, frame.location);
                    if element.is_in(self.directive_ns()) {
                        match Directive::from_local_name(&element.name) {
                            Some(directive) => {
                                self.directive(directive, element, target, data, frame, &location)?
                            }
                            None => self.warnings.raise(
                                WarningKind::ElementNotAllowed,
                                "Element not allowed here.",
                                &location,
                            ),
                        }
                    } else {
                        let namespace = element
                            .namespace
                            .as_deref()
                            .unwrap_or(&self.config.default_namespace);
                        let mut output = OutputElement::new(namespace, element.name.as_str());
                        self.process_attributes(element, &mut output, data, &location);
                        self.process_children(element, &mut output, data, frame, &location)?;
                        self.postproduction(element, &mut output, data, &location)?;
                        target.append_child(output);
                    }
                }
            }
        }
        Ok(())
    }

    fn directive(
        &mut self,
        directive: Directive,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        frame: &Frame<'_>,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        match directive {
            Directive::Text => {
                if let Some(text) = node.first_text() {
                    target.append_text(substitute(text, data));
                }
                Ok(())
            }
            Directive::CallFunction => self.call_function(node, target, data, origin),
            Directive::If => self.if_directive(node, target, data, frame, origin).map(|_| ()),
            Directive::Choose => self.choose(node, target, data, frame, origin),
            Directive::ForEach => self.for_each(node, target, data, frame, origin),
            Directive::ForEmpty => self.for_empty(node, target, data, frame, origin),
            Directive::InsertSnippet => self.insert_snippet(node, target, data, frame, origin),
            Directive::Else => {
                self.warnings.raise(
                    WarningKind::ElementNotAllowed,
                    "Element not allowed outside of <choose>.",
                    origin,
                );
                Ok(())
            }
        }
    }

    /// Value of a directive attribute, qualified or not
    fn attribute<'n>(&self, node: &'n Element, name: &str) -> Option<&'n str> {
        node.attribute_either(self.directive_ns(), name)
    }

    fn call_function(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        let path = self.attribute(node, "name").unwrap_or_default();
        invoke(CallableRole::CallFunction, path, target, data, origin)
    }

    /// Produce the children when the test holds; returns the test result
    fn if_directive(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        frame: &Frame<'_>,
        origin: &Origin,
    ) -> Result<bool, ProduceError> {
        let test = match self.attribute(node, "test") {
            Some(test) => TestExpression::parse(test),
            None => Err(ExpressionError::invalid("", "missing \"test\" attribute")),
        }
        .map_err(|e| e.with_origin(origin.trail()))?;

        let matched = test.evaluate(data);
        if matched {
            self.process_children(node, target, data, frame, origin)?;
        }
        Ok(matched)
    }

    fn choose(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        frame: &Frame<'_>,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        let mode = match self.attribute(node, "mode") {
            None => ChooseMode::Strict,
            Some(name) => ChooseMode::from_name(name).unwrap_or_else(|| {
                self.warnings.raise(
                    WarningKind::InvalidChooseMode,
                    format!("Invalid choose mode \"{}\", using \"strict\".", name),
                    origin,
                );
                ChooseMode::Strict
            }),
        };

        let mut any_match = false;
        for child in node.child_elements() {
            let location = origin.enter(child, frame.location);
            let directive = if child.is_in(self.directive_ns()) {
                Directive::from_local_name(&child.name)
            } else {
                None
            };
            match directive {
                Some(Directive::If) => {
                    any_match |= self.if_directive(child, target, data, frame, &location)?;
                    if any_match && mode == ChooseMode::Strict {
                        break;
                    }
                }
                Some(Directive::Else) => {
                    if !any_match {
                        self.process_children(child, target, data, frame, &location)?;
                    }
                }
                _ => self.warnings.raise(
                    WarningKind::ElementNotAllowed,
                    "Element not allowed here.",
                    &location,
                ),
            }
        }
        Ok(())
    }

    fn for_each(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        frame: &Frame<'_>,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        let path = self.attribute(node, "list").unwrap_or_default();
        let items = match resolve_path(data, path) {
            Some(Value::List(items)) => items,
            other => {
                return Err(ProduceError::NotAList {
                    path: path.to_string(),
                    found: other.map_or("undefined", Value::type_name),
                    origin: origin.trail(),
                })
            }
        };

        let count = items.len();
        for (i, item) in items.iter().enumerate() {
            let mut scope = match item {
                Value::Map(record) => record.clone(),
                other => Data::new().with("_value", other.clone()),
            };
            scope.insert("_position", i + 1);
            scope.insert("_count", count);
            self.process_children(node, target, &data.merged(&scope), frame, origin)?;
        }
        Ok(())
    }

    fn for_empty(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        frame: &Frame<'_>,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        let path = self.attribute(node, "list").unwrap_or_default();
        let has_items = matches!(
            resolve_path(data, path),
            Some(Value::List(items)) if !items.is_empty()
        );
        if !has_items {
            self.process_children(node, target, data, frame, origin)?;
        }
        Ok(())
    }

    fn insert_snippet(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        frame: &Frame<'_>,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        let name = self.attribute(node, "name").unwrap_or_default();
        let key = SnippetKey::new(substitute(name, data));
        let inserted = self.produce_with_chain(&key, data, frame.chain, origin)?;
        target.append_child(inserted);
        Ok(())
    }

    fn process_attributes(
        &mut self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        origin: &Origin,
    ) {
        for attr in &node.attributes {
            if attr.namespace.as_deref() != Some(self.directive_ns()) {
                target.set_attribute(OutputAttribute {
                    namespace: attr.namespace.clone(),
                    prefix: attr.prefix.clone(),
                    name: attr.name.clone(),
                    value: substitute(&attr.value, data),
                });
            } else if attr.name.len() > 2 && attr.name.starts_with("on") {
                match resolve_path(data, &attr.value).and_then(Value::as_callback) {
                    Some(handler) => target.set_handler(attr.name.as_str(), handler.clone()),
                    None => self.warnings.raise(
                        WarningKind::HandlerNotCallable,
                        format!("Event handler \"{}\" is not callable.", attr.value),
                        origin,
                    ),
                }
            } else if attr.name != "postproduction" {
                self.warnings.raise(
                    WarningKind::AttributeNotAllowed,
                    format!("Attribute \"{}\" is not allowed here.", attr.qualified_name()),
                    origin,
                );
            }
        }
    }

    /// Run the element's `postproduction` callable once it is complete
    fn postproduction(
        &self,
        node: &Element,
        target: &mut OutputElement,
        data: &Data,
        origin: &Origin,
    ) -> Result<(), ProduceError> {
        match node.attribute_ns(Some(self.directive_ns()), "postproduction") {
            Some(path) => invoke(CallableRole::Postproduction, path, target, data, origin),
            None => Ok(()),
        }
    }
}

fn invoke(
    role: CallableRole,
    path: &str,
    target: &mut OutputElement,
    data: &Data,
    origin: &Origin,
) -> Result<(), ProduceError> {
    let Some(callback) = resolve_path(data, path).and_then(Value::as_callback) else {
        return Err(ProduceError::NotCallable {
            role,
            path: path.to_string(),
            origin: origin.trail(),
        });
    };
    callback
        .call(target, data)
        .map_err(|error| ProduceError::Callback {
            path: path.to_string(),
            error,
            origin: origin.trail(),
        })
}
