//! Snippet registry for storing and retrieving snippet definitions

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::markup::Element;

use super::key::{group_path, SnippetKey};

/// Errors that can occur during registry lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Snippet not found in registry
    #[error("unknown snippet \"{key}\"")]
    NotFound { key: SnippetKey },
}

/// A stored snippet definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRecord {
    pub key: SnippetKey,
    /// Identifier of the source the snippet was imported from
    pub source: String,
    /// Namespace of the produced root element
    pub namespace: String,
    /// The snippet's single root template element
    pub template: Element,
}

impl SnippetRecord {
    /// Call chain token, `source:key`
    pub fn token(&self) -> String {
        format!("{}:{}", self.source, self.key)
    }
}

/// Registry for storing snippet definitions
#[derive(Debug, Default)]
pub struct SnippetRegistry {
    snippets: BTreeMap<SnippetKey, Arc<SnippetRecord>>,
    /// Sources that have been imported
    sources: HashSet<String>,
}

impl SnippetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under its key. An existing record with the same key is
    /// replaced and returned.
    pub fn put(&mut self, record: SnippetRecord) -> Option<Arc<SnippetRecord>> {
        let key = record.key.clone();
        let previous = self.snippets.insert(key.clone(), Arc::new(record));
        if let Some(prev) = &previous {
            debug!(key = %key, previous_source = %prev.source, "replacing snippet");
        }
        previous
    }

    /// Check if a snippet exists
    pub fn has(&self, key: impl Into<SnippetKey>) -> bool {
        self.snippets.contains_key(&key.into())
    }

    /// Get a snippet by key
    pub fn get(&self, key: impl Into<SnippetKey>) -> Result<Arc<SnippetRecord>, RegistryError> {
        let key = key.into();
        self.snippets
            .get(&key)
            .cloned()
            .ok_or(RegistryError::NotFound { key })
    }

    /// Remember that a source has been imported
    pub fn mark_source(&mut self, source: impl Into<String>) {
        self.sources.insert(source.into());
    }

    /// Check if a source has been imported before
    pub fn has_source(&self, source: &str) -> bool {
        self.sources.contains(source)
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// All keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &SnippetKey> {
        self.snippets.keys()
    }

    /// Snippets of a group. Direct members come first; with `recursive`,
    /// each sub-group's snippets follow, depth-first.
    pub fn list_snippets(&self, prefix: &str, recursive: bool) -> Vec<SnippetKey> {
        let group = group_path(prefix);
        let mut keys: Vec<SnippetKey> = self
            .snippets
            .keys()
            .filter(|k| k.group() == group)
            .cloned()
            .collect();
        if recursive {
            for sub in self.direct_groups(&group) {
                keys.extend(self.list_snippets(&sub, true));
            }
        }
        keys
    }

    /// Sub-group paths of a group, each with a trailing slash. With
    /// `recursive`, nested groups follow their parent.
    pub fn list_groups(&self, prefix: &str, recursive: bool) -> Vec<String> {
        let group = group_path(prefix);
        let mut groups = Vec::new();
        for sub in self.direct_groups(&group) {
            let nested = if recursive {
                self.list_groups(&sub, true)
            } else {
                Vec::new()
            };
            groups.push(sub);
            groups.extend(nested);
        }
        groups
    }

    fn direct_groups(&self, group: &str) -> BTreeSet<String> {
        self.snippets
            .keys()
            .filter_map(|k| {
                let rest = k.as_str().strip_prefix(group)?;
                let end = rest.find('/')?;
                Some(format!("{}{}/", group, &rest[..end]))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(key: &str, source: &str) -> SnippetRecord {
        SnippetRecord {
            key: SnippetKey::new(key),
            source: source.to_string(),
            namespace: "urn:out".to_string(),
            template: Element::new(Some("urn:out"), "div"),
        }
    }

    fn sample() -> SnippetRegistry {
        let mut registry = SnippetRegistry::new();
        for key in ["/top", "/nav/item", "/nav/bar", "/nav/menu/entry", "/footer/note"] {
            registry.put(record(key, "a.xml"));
        }
        registry
    }

    fn strings(keys: Vec<SnippetKey>) -> Vec<String> {
        keys.into_iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_registry_put_and_get() {
        let registry = sample();
        assert!(registry.has("nav//item"));
        assert!(registry.has(["nav", "item"]));
        let rec = registry.get("/nav/item").expect("Should exist");
        assert_eq!(rec.token(), "a.xml:/nav/item");
    }

    #[test]
    fn test_registry_not_found_error() {
        let registry = sample();
        let err = registry.get("nope").expect_err("Should not exist");
        assert_eq!(err.to_string(), "unknown snippet \"/nope\"");
    }

    #[test]
    fn test_put_overwrites() {
        let mut registry = sample();
        let previous = registry.put(record("/top", "b.xml"));
        assert_eq!(previous.map(|p| p.source.clone()), Some("a.xml".to_string()));
        assert_eq!(registry.get("/top").map(|r| r.source.clone()), Ok("b.xml".to_string()));
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_list_snippets() {
        let registry = sample();
        assert_eq!(strings(registry.list_snippets("/", false)), vec!["/top"]);
        assert_eq!(
            strings(registry.list_snippets("nav", false)),
            vec!["/nav/bar", "/nav/item"]
        );
        assert_eq!(
            strings(registry.list_snippets("/", true)),
            vec!["/top", "/footer/note", "/nav/bar", "/nav/item", "/nav/menu/entry"]
        );
    }

    #[test]
    fn test_list_groups() {
        let registry = sample();
        assert_eq!(registry.list_groups("", false), vec!["/footer/", "/nav/"]);
        assert_eq!(
            registry.list_groups("", true),
            vec!["/footer/", "/nav/", "/nav/menu/"]
        );
        assert_eq!(registry.list_groups("/nav/", false), vec!["/nav/menu/"]);
        assert!(registry.list_groups("/top", true).is_empty());
    }

    #[test]
    fn test_sources() {
        let mut registry = SnippetRegistry::new();
        assert!(!registry.has_source("a.xml"));
        registry.mark_source("a.xml");
        assert!(registry.has_source("a.xml"));
    }
}
