//! Stable, machine-readable DTOs shared by the services layer and the CLI.
//! All types carry serde + JsonSchema derives; `locsync schema` dumps their
//! JSON schemas for external tooling.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Diff classification for one target locale file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FileDiffReport {
    pub path: String,
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
    /// Set when the target file could not be read or parsed; the key lists
    /// are empty in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Diff classification for one target locale across all file groups.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocaleDiffReport {
    pub schema_version: u32,
    pub locale: String,
    pub files: Vec<FileDiffReport>,
}

/// One per-unit or per-file problem surfaced in the end-of-run summary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnitIssue {
    pub locale: String,
    pub path: String,
    pub key: String,
    /// "placeholder-mismatch" | "provider-failed" | "empty-translation" | "missing-in-response"
    pub kind: String,
    pub message: String,
}

/// Outcome for one target locale file after merge/write-back.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileSyncStat {
    pub path: String,
    /// "created" | "updated" | "skipped" | "planned" | "failed"
    pub status: String,
    pub translated: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// Outcome for one target locale.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocaleSyncStat {
    pub locale: String,
    pub files: Vec<FileSyncStat>,
    pub translated: usize,
    pub removed: usize,
    pub failed: usize,
}

/// End-of-run summary over all target locales.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncSummary {
    pub schema_version: u32,
    pub mode: String,
    pub source_locale: String,
    pub locales: Vec<LocaleSyncStat>,
    pub issues: Vec<UnitIssue>,
    pub provider_calls: usize,
}

impl SyncSummary {
    pub fn total_translated(&self) -> usize {
        self.locales.iter().map(|l| l.translated).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.locales.iter().map(|l| l.failed).sum()
    }
}
