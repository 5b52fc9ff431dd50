//! Turns parsed snippet documents into registry entries

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::diagnostics::{Origin, ValidationWarning, WarningKind, Warnings};
use crate::markup::{Element, MarkupError};

use super::key::SnippetKey;
use super::registry::{SnippetRecord, SnippetRegistry};

/// Errors that abort an import
#[derive(Debug, Error)]
pub enum LoadError {
    /// Document root is not a snippet document element
    #[error("\"{location}\" is not a snippet document: root element is <{found}>")]
    NotATemplateDocument { location: String, found: String },

    /// Source text could not be read as markup
    #[error("\"{location}\" is not well-formed: {error}")]
    Markup {
        location: String,
        #[source]
        error: MarkupError,
    },
}

/// Kind of an auxiliary resource referenced by a snippet document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Stylesheet,
    Script,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Stylesheet => write!(f, "stylesheet"),
            ResourceKind::Script => write!(f, "script"),
        }
    }
}

/// A stylesheet or script to be included by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    /// Path normalized against the importing source
    pub path: String,
}

/// Receives the auxiliary resources found while importing.
///
/// Inclusion into a presentation surface, deduplication and load sequencing
/// are up to the host.
pub trait ResourceHost {
    fn report_resource(&mut self, resource: &ResourceRef);
}

/// Hosts without a presentation surface
impl ResourceHost for () {
    fn report_resource(&mut self, _resource: &ResourceRef) {}
}

impl ResourceHost for Vec<ResourceRef> {
    fn report_resource(&mut self, resource: &ResourceRef) {
        self.push(resource.clone());
    }
}

/// Outcome of one import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub source: String,
    /// The source had been imported before; nothing was done
    pub skipped: bool,
    /// Keys stored by this import, in document order
    pub snippets: Vec<SnippetKey>,
    /// Resources reported to the host, in reporting order
    pub resources: Vec<ResourceRef>,
    pub warnings: Vec<ValidationWarning>,
}

impl ImportReport {
    pub(crate) fn skipped(source: &str) -> Self {
        Self {
            source: source.to_string(),
            skipped: true,
            ..Self::default()
        }
    }
}

/// Import a parsed snippet document into the registry.
///
/// Snippets and groups may appear anywhere in the group tree; stylesheets and
/// scripts only at the document root. Stylesheets are reported as they are
/// met, scripts after the whole document has been read.
pub fn load(
    registry: &mut SnippetRegistry,
    config: &EngineConfig,
    source: &str,
    document: &Element,
    host: &mut dyn ResourceHost,
) -> Result<ImportReport, LoadError> {
    if registry.has_source(source) {
        debug!(source, "already imported");
        return Ok(ImportReport::skipped(source));
    }
    if !document.is_in(&config.directive_namespace) || document.name != config.document_element {
        return Err(LoadError::NotATemplateDocument {
            location: source.to_string(),
            found: document.qualified_name(),
        });
    }

    let mut loader = Loader {
        registry,
        config,
        source,
        host,
        report: ImportReport {
            source: source.to_string(),
            ..ImportReport::default()
        },
        warnings: Warnings::new(),
        scripts: Vec::new(),
    };
    loader.walk(document, "", &Origin::root());

    let Loader {
        registry,
        host,
        mut report,
        warnings,
        scripts,
        ..
    } = loader;
    for script in scripts {
        host.report_resource(&script);
        report.resources.push(script);
    }
    report.warnings = warnings.into_vec();
    registry.mark_source(source);
    Ok(report)
}

struct Loader<'a> {
    registry: &'a mut SnippetRegistry,
    config: &'a EngineConfig,
    source: &'a str,
    host: &'a mut dyn ResourceHost,
    report: ImportReport,
    warnings: Warnings,
    scripts: Vec<ResourceRef>,
}

impl Loader<'_> {
    fn walk(&mut self, node: &Element, group: &str, origin: &Origin) {
        let config = self.config;
        let ns = config.directive_namespace.as_str();
        for child in node.child_elements() {
            let location = origin.enter(child, self.source);
            if !child.is_in(ns) {
                self.warnings
                    .raise(WarningKind::UnexpectedElement, "Unexpected element.", &location);
                continue;
            }
            match (child.name.as_str(), group.is_empty()) {
                ("snippet", _) => self.snippet(child, group, &location),
                ("snippet-group", _) => match child.attribute_either(ns, "name") {
                    Some(name) => {
                        let sub = format!("{}/{}", group, name);
                        self.walk(child, &sub, &location);
                    }
                    None => self.warnings.raise(
                        WarningKind::MissingAttribute,
                        "Snippet group without \"name\" attribute.",
                        &location,
                    ),
                },
                ("stylesheet", true) => {
                    let resource = self.resource(child, ResourceKind::Stylesheet, &location);
                    if let Some(resource) = resource {
                        self.host.report_resource(&resource);
                        self.report.resources.push(resource);
                    }
                }
                ("script", true) => {
                    if let Some(resource) = self.resource(child, ResourceKind::Script, &location) {
                        self.scripts.push(resource);
                    }
                }
                _ => self.warnings.raise(
                    WarningKind::ElementNotAllowed,
                    "Element not allowed here.",
                    &location,
                ),
            }
        }
    }

    fn snippet(&mut self, node: &Element, group: &str, origin: &Origin) {
        let Some(name) = node.attribute_either(&self.config.directive_namespace, "name") else {
            self.warnings.raise(
                WarningKind::MissingAttribute,
                "Snippet without \"name\" attribute.",
                origin,
            );
            return;
        };
        let mut roots = node.child_elements();
        let Some(template) = roots.next() else {
            self.warnings
                .raise(WarningKind::EmptySnippet, "Snippet has no element.", origin);
            return;
        };
        if roots.next().is_some() {
            self.warnings.raise(
                WarningKind::MultipleRootElements,
                "Only one child element allowed.",
                origin,
            );
        }

        let key = SnippetKey::new(format!("{}/{}", group, name));
        let namespace = template
            .namespace
            .clone()
            .unwrap_or_else(|| self.config.default_namespace.clone());
        debug!(key = %key, source = self.source, "storing snippet");
        self.registry.put(SnippetRecord {
            key: key.clone(),
            source: self.source.to_string(),
            namespace,
            template: template.clone(),
        });
        self.report.snippets.push(key);
    }

    fn resource(
        &mut self,
        node: &Element,
        kind: ResourceKind,
        origin: &Origin,
    ) -> Option<ResourceRef> {
        match node.attribute("src") {
            Some(src) => Some(ResourceRef {
                kind,
                path: normalize_resource_path(self.source, src),
            }),
            None => {
                self.warnings.raise(
                    WarningKind::MissingAttribute,
                    format!("The {} has no \"src\" attribute.", kind),
                    origin,
                );
                None
            }
        }
    }
}

/// Resolve a resource path against the identifier of the importing source
pub fn normalize_resource_path(source: &str, path: &str) -> String {
    if path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = match source.rfind('/') {
        Some(i) => &source[..=i],
        None => "",
    };
    let relative = path.strip_prefix("./").unwrap_or(path);
    let joined = format!("{}{}", base, relative);

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segments.last() {
            Some(last) if segment == ".." && !last.is_empty() && *last != ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}
