//! Snippet Press - declarative snippet production
//!
//! This library imports XML snippet documents into a registry and produces
//! output element trees from them, interpreting a small directive language
//! (conditionals, loops, function hooks, nested snippets, `{{ path }}`
//! substitution) against a data record.
//!
//! # Example
//!
//! ```rust
//! use snippet_press::{Data, SnippetEngine};
//!
//! let mut engine = SnippetEngine::new();
//! engine
//!     .import_str(
//!         "greetings.xml",
//!         r#"<ps:pagesnippets xmlns:ps="https://github.com/suppenhuhn79/pagesnippets">
//!                <ps:snippet name="greet"><p>Hello, {{name}}!</p></ps:snippet>
//!            </ps:pagesnippets>"#,
//!         &mut (),
//!     )
//!     .unwrap();
//!
//! let p = engine.produce("/greet", &Data::new().with("name", "Ada")).unwrap();
//! assert_eq!(p.text_content(), "Hello, Ada!");
//! ```

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod markup;
pub mod production;
pub mod template;
pub mod variables;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

pub use config::{ConfigError, EngineConfig};
pub use data::{Callable, Callback, CallbackError, Data, Value};
pub use diagnostics::{OriginFrame, OriginTrail, ValidationWarning, WarningKind};
pub use error::ExpressionError;
pub use markup::{Element, MarkupError, TemplateNode};
pub use production::{OutputAttribute, OutputElement, OutputNode, ProduceError, Production};
pub use template::{
    ImportReport, LoadError, RegistryError, ResourceHost, ResourceKind, ResourceRef, SnippetKey,
    SnippetRecord, SnippetRegistry,
};

/// Errors of the combined read-and-produce pipeline
#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("production error: {0}")]
    Produce(#[from] ProduceError),
}

/// A snippet registry together with the configuration used to fill and
/// produce from it.
///
/// Imports take `&mut self` and productions `&self`, so a shared engine has
/// every import complete before productions read from it. Hosts that import
/// while serving productions wrap the engine in a `RwLock`.
#[derive(Debug, Default)]
pub struct SnippetEngine {
    registry: SnippetRegistry,
    config: EngineConfig,
}

impl SnippetEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            registry: SnippetRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SnippetRegistry {
        &self.registry
    }

    /// Import a parsed snippet document. A source imported before is skipped.
    pub fn import(
        &mut self,
        source: &str,
        document: &Element,
        host: &mut dyn ResourceHost,
    ) -> Result<ImportReport, LoadError> {
        let report = template::load(&mut self.registry, &self.config, source, document, host)?;
        if !report.skipped {
            info!(
                source,
                snippets = report.snippets.len(),
                resources = report.resources.len(),
                warnings = report.warnings.len(),
                "imported snippet document"
            );
        }
        Ok(report)
    }

    /// Parse snippet document text and import it
    pub fn import_str(
        &mut self,
        source: &str,
        text: &str,
        host: &mut dyn ResourceHost,
    ) -> Result<ImportReport, LoadError> {
        if self.registry.has_source(source) {
            debug!(source, "already imported");
            return Ok(ImportReport::skipped(source));
        }
        let document = markup::parse(text).map_err(|error| LoadError::Markup {
            location: source.to_string(),
            error,
        })?;
        self.import(source, &document, host)
    }

    pub fn has_snippet(&self, key: impl Into<SnippetKey>) -> bool {
        self.registry.has(key)
    }

    pub fn get_snippet(
        &self,
        key: impl Into<SnippetKey>,
    ) -> Result<Arc<SnippetRecord>, RegistryError> {
        self.registry.get(key)
    }

    /// Keys of the snippets in a group, see [`SnippetRegistry::list_snippets`]
    pub fn list_snippets(&self, prefix: &str, recursive: bool) -> Vec<SnippetKey> {
        self.registry.list_snippets(prefix, recursive)
    }

    /// Sub-groups of a group, see [`SnippetRegistry::list_groups`]
    pub fn list_groups(&self, prefix: &str, recursive: bool) -> Vec<String> {
        self.registry.list_groups(prefix, recursive)
    }

    /// Produce a snippet, discarding warnings (they are still logged)
    pub fn produce(
        &self,
        key: impl Into<SnippetKey>,
        data: &Data,
    ) -> Result<OutputElement, ProduceError> {
        Ok(self.produce_report(key, data)?.output)
    }

    /// Produce a snippet, returning the warnings raised along with the output
    pub fn produce_report(
        &self,
        key: impl Into<SnippetKey>,
        data: &Data,
    ) -> Result<Production, ProduceError> {
        production::produce(&self.registry, &self.config, key, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<ps:pagesnippets xmlns:ps="https://github.com/suppenhuhn79/pagesnippets">
    <ps:snippet name="greet"><p>Hello, {{name}}!</p></ps:snippet>
</ps:pagesnippets>"#;

    #[test]
    fn test_import_and_produce() {
        let mut engine = SnippetEngine::new();
        let report = engine.import_str("a.xml", DOC, &mut ()).expect("Should import");
        assert_eq!(report.snippets, vec![SnippetKey::new("/greet")]);
        assert!(engine.has_snippet("greet"));

        let p = engine
            .produce("/greet", &Data::new().with("name", "Ada"))
            .expect("Should produce");
        assert_eq!(p.text_content(), "Hello, Ada!");
    }

    #[test]
    fn test_reimport_skips_without_parsing() {
        let mut engine = SnippetEngine::new();
        engine.import_str("a.xml", DOC, &mut ()).expect("Should import");
        let again = engine
            .import_str("a.xml", "not even xml <", &mut ())
            .expect("Known source is skipped");
        assert!(again.skipped);
    }

    #[test]
    fn test_markup_error_is_load_error() {
        let mut engine = SnippetEngine::new();
        let err = engine.import_str("bad.xml", "<a><b></a>", &mut ()).expect_err("Should fail");
        assert!(matches!(err, LoadError::Markup { .. }));
        assert!(err.to_string().starts_with("\"bad.xml\" is not well-formed"));
    }

    #[test]
    fn test_custom_directive_namespace() {
        let config = EngineConfig::default().with_directive_namespace("urn:snippets");
        let mut engine = SnippetEngine::with_config(config);
        let doc = r#"<s:pagesnippets xmlns:s="urn:snippets"><s:snippet name="x"><b><s:text>ok</s:text></b></s:snippet></s:pagesnippets>"#;
        engine.import_str("c.xml", doc, &mut ()).expect("Should import");
        let b = engine.produce("x", &Data::new()).expect("Should produce");
        assert_eq!(b.text_content(), "ok");
    }
}
