//! The diff–extract–translate–merge pipeline. Thin orchestration over the
//! core/format/store/provider crates; exposes stable entrypoints used by the
//! CLI.

use std::path::PathBuf;

pub mod diff;
pub mod extract;
pub mod loader;
pub mod merge;
pub mod orchestrator;
pub mod pipeline;
pub(crate) mod util;

pub use locsync_core::{ContentNode, KeyPath, LocaleId, Result, TranslationUnit};
pub use pipeline::{diff_report, run_sync, SyncOptions};

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] locsync_config::ConfigError),
    #[error("no source file matched {template:?} (group {group:?})")]
    MissingSourceFile { group: String, template: String },
    #[error("invalid glob pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
    #[error("failed to read {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Format(#[from] locsync_formats::FormatError),
    #[error(transparent)]
    Store(#[from] locsync_store::StoreError),
    #[error(transparent)]
    Provider(#[from] locsync_provider::ProviderError),
    #[error("failed to write {path:?}: {source}")]
    MergeWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("translation provider unavailable after retries, no unit could be translated")]
    ProviderUnavailable,
}
