//! Shared domain types for the sync pipeline: locale identifiers, the
//! format-agnostic content tree, key paths, translation units and content
//! fingerprints. Higher-level crates (formats, services, CLI) build on these.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod placeholders;
pub mod tree;

pub use tree::ContentNode;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Opaque locale identifier, e.g. "en" or "pt-BR".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleId(pub String);

impl LocaleId {
    pub fn new(s: impl Into<String>) -> Self {
        LocaleId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocaleId {
    fn from(s: &str) -> Self {
        LocaleId(s.to_string())
    }
}

/// Ordered key sequence from the tree root down to a leaf.
///
/// Persisted as a string list so keys that themselves contain `.` never
/// collide; `Display` joins with `.` for human-readable output only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(pub Vec<String>);

impl KeyPath {
    pub fn root() -> Self {
        KeyPath(Vec::new())
    }

    pub fn push(&self, segment: &str) -> Self {
        let mut segs = self.0.clone();
        segs.push(segment.to_string());
        KeyPath(segs)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// One extracted source string: stable key path, text, the placeholder
/// tokens the text carries and a content fingerprint of the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub key_path: KeyPath,
    pub source_text: String,
    pub placeholders: std::collections::BTreeSet<String>,
    pub fingerprint: String,
}

impl TranslationUnit {
    pub fn new(key_path: KeyPath, source_text: impl Into<String>) -> Self {
        let source_text = source_text.into();
        let placeholders = placeholders::extract_placeholders(&source_text);
        let fingerprint = fingerprint(&source_text);
        TranslationUnit {
            key_path,
            source_text,
            placeholders,
            fingerprint,
        }
    }
}

/// Content fingerprint: blake3 hex digest of the text.
pub fn fingerprint(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_path_display_joins_with_dots() {
        let kp = KeyPath::root().push("settings").push("title");
        assert_eq!(kp.to_string(), "settings.title");
    }

    #[test]
    fn fingerprint_is_stable_and_distinguishes_text() {
        assert_eq!(fingerprint("Hello"), fingerprint("Hello"));
        assert_ne!(fingerprint("Hello"), fingerprint("Hi"));
    }

    #[test]
    fn unit_captures_placeholders() {
        let u = TranslationUnit::new(KeyPath::root().push("greeting"), "Hello {name}");
        assert!(u.placeholders.contains("{name}"));
    }
}
