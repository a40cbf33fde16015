//! Pluggable file-format adapters. Each adapter maps raw bytes to the
//! format-agnostic [`ContentNode`] tree and back; everything downstream
//! (extractor, diff, merger) is format-blind.
//!
//! Adapters must keep branch key order intact and re-serialize untouched
//! content byte-identically for files the tool wrote itself.

use locsync_core::ContentNode;

mod json;
mod yaml;

pub use json::JsonAdapter;
pub use yaml::YamlAdapter;

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("invalid {format}: {message}")]
    Parse { format: &'static str, message: String },
    #[error("cannot serialize {format}: {message}")]
    Serialize { format: &'static str, message: String },
    #[error("{format} mapping key is not a string")]
    NonStringKey { format: &'static str },
    #[error("unknown format tag {0:?}")]
    UnknownTag(String),
}

pub trait FormatAdapter: Send + Sync {
    /// Tag used in the config's `files` table, e.g. "json".
    fn tag(&self) -> &'static str;
    /// File extension for resolved paths, without the dot.
    fn extension(&self) -> &'static str;
    fn parse(&self, bytes: &[u8]) -> Result<ContentNode, FormatError>;
    fn serialize(&self, tree: &ContentNode) -> Result<Vec<u8>, FormatError>;
}

/// Adapter registered for a config format tag.
pub fn adapter_for(tag: &str) -> Result<&'static dyn FormatAdapter, FormatError> {
    static JSON: JsonAdapter = JsonAdapter;
    static YAML: YamlAdapter = YamlAdapter;
    match tag {
        "json" => Ok(&JSON),
        "yaml" | "yml" => Ok(&YAML),
        other => Err(FormatError::UnknownTag(other.to_string())),
    }
}

/// Tags with a registered adapter, for config validation and help output.
pub fn known_tags() -> &'static [&'static str] {
    &["json", "yaml", "yml"]
}
