//! Engine configuration
//!
//! Namespace URIs and the document element name can be overridden from a
//! TOML file, e.g.
//!
//! ```toml
//! directive_namespace = "https://github.com/suppenhuhn79/pagesnippets"
//! default_namespace = "http://www.w3.org/1999/xhtml"
//! document_element = "pagesnippets"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Namespace of directive elements and attributes
pub const DIRECTIVE_NAMESPACE: &str = "https://github.com/suppenhuhn79/pagesnippets";

/// Namespace given to output elements whose source has none
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Local name of the template-definition document element
pub const DOCUMENT_ELEMENT: &str = "pagesnippets";

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration of a [`SnippetEngine`](crate::SnippetEngine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Namespace URI that marks elements and attributes as directives
    pub directive_namespace: String,
    /// Namespace for output elements whose source element has none
    pub default_namespace: String,
    /// Local name of the root element of template-definition documents
    pub document_element: String,
}

/// TOML structure for deserializing configs
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    directive_namespace: Option<String>,
    default_namespace: Option<String>,
    document_element: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            directive_namespace: DIRECTIVE_NAMESPACE.to_string(),
            default_namespace: XHTML_NAMESPACE.to_string(),
            document_element: DOCUMENT_ELEMENT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; absent keys keep their defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        Ok(EngineConfig {
            directive_namespace: parsed
                .directive_namespace
                .unwrap_or(defaults.directive_namespace),
            default_namespace: parsed.default_namespace.unwrap_or(defaults.default_namespace),
            document_element: parsed.document_element.unwrap_or(defaults.document_element),
        })
    }

    /// Set the directive namespace
    pub fn with_directive_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.directive_namespace = namespace.into();
        self
    }

    /// Set the default output namespace
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    /// Set the document element name
    pub fn with_document_element(mut self, name: impl Into<String>) -> Self {
        self.document_element = name.into();
        self
    }
}
