//! Normalized snippet keys

use std::fmt;

/// Slash-separated snippet path: always starts with `/`, never contains `//`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnippetKey(String);

impl SnippetKey {
    /// Normalize a key given as a single path string
    pub fn new(key: impl AsRef<str>) -> Self {
        SnippetKey(normalize(key.as_ref(), false))
    }

    /// Normalize a key given as path segments, e.g. `["nav", "item"]`
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(join(segments))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Group part of the key, with a trailing slash (`/a/b` -> `/a/`)
    pub fn group(&self) -> &str {
        match self.0.rfind('/') {
            Some(i) => &self.0[..=i],
            None => "/",
        }
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(i) => &self.0[i + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for SnippetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SnippetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SnippetKey {
    fn from(key: &str) -> Self {
        SnippetKey::new(key)
    }
}

impl From<String> for SnippetKey {
    fn from(key: String) -> Self {
        SnippetKey::new(key)
    }
}

impl From<&String> for SnippetKey {
    fn from(key: &String) -> Self {
        SnippetKey::new(key)
    }
}

impl From<&SnippetKey> for SnippetKey {
    fn from(key: &SnippetKey) -> Self {
        key.clone()
    }
}

impl<S: AsRef<str>> From<&[S]> for SnippetKey {
    fn from(segments: &[S]) -> Self {
        SnippetKey::from_segments(segments)
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for SnippetKey {
    fn from(segments: [S; N]) -> Self {
        SnippetKey::from_segments(&segments)
    }
}

/// Normalize a group path: leading and trailing slash, no repeated slashes
pub fn group_path(path: impl AsRef<str>) -> String {
    normalize(path.as_ref(), true)
}

/// Normalize a group path given as segments
pub fn group_path_from_segments<S: AsRef<str>>(segments: &[S]) -> String {
    normalize(&join(segments), true)
}

fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize(key: &str, as_group: bool) -> String {
    let mut out = String::with_capacity(key.len() + 2);
    out.push('/');
    for c in key.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    if as_group && !out.ends_with('/') {
        out.push('/');
    }
    out
}
