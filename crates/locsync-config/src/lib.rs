//! Project configuration: the declarative schema consumed by the sync
//! pipeline (`locsync.toml` or `locsync.json` at the project root) plus an
//! optional user-level overlay for the `[sync]` policy table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use locsync_core::LocaleId;

/// Literal placeholder substituted with a locale id in path templates.
pub const LOCALE_TOKEN: &str = "[locale]";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("no locsync.toml or locsync.json found at {0:?}")]
    NotFound(PathBuf),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("source locale {0} is also listed as a target")]
    SourceInTargets(LocaleId),
    #[error("locale.targets must not be empty")]
    NoTargets,
    #[error("target locale {0} is listed more than once")]
    DuplicateTarget(LocaleId),
    #[error("files.{group}: template {template:?} does not contain \"[locale]\"")]
    TemplateWithoutLocale { group: String, template: String },
    #[error("files.{group}: include list is empty")]
    EmptyGroup { group: String },
    #[error("files table is empty, nothing to sync")]
    NoFileGroups,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub version: String,
    pub locale: LocaleSection,
    /// Format tag -> file group; tag order is preserved for reporting.
    pub files: BTreeMap<String, FileGroup>,
    pub llm: LlmSection,
    #[serde(default)]
    pub sync: SyncPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocaleSection {
    pub source: LocaleId,
    pub targets: Vec<LocaleId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileGroup {
    /// Path templates containing the `[locale]` placeholder; may use globs.
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    pub provider: String,
    pub model: String,
    /// Override for OpenAI-compatible endpoints.
    pub base_url: Option<String>,
    /// Environment variable holding the API key (default OPENAI_API_KEY).
    pub api_key_env: Option<String>,
}

/// Provider throughput and retry tunables; all bounded and conservative by
/// default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    pub batch_size: usize,
    pub max_concurrent_batches: usize,
    pub max_parallel_locales: usize,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        SyncPolicy {
            batch_size: 25,
            max_concurrent_batches: 4,
            max_parallel_locales: 4,
            max_attempts: 3,
            backoff_base_ms: 250,
            backoff_max_ms: 10_000,
        }
    }
}

/// Partial `[sync]` table from the user-level config, merged field-by-field
/// under the project config.
#[derive(Debug, Clone, Default, Deserialize)]
struct SyncPolicyOverlay {
    batch_size: Option<usize>,
    max_concurrent_batches: Option<usize>,
    max_parallel_locales: Option<usize>,
    max_attempts: Option<u32>,
    backoff_base_ms: Option<u64>,
    backoff_max_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    sync: SyncPolicyOverlay,
}

/// Load and validate the project config from `root`, applying the user-level
/// `[sync]` overlay from `dirs::config_dir()/locsync/locsync.toml` for fields
/// the project config does not set explicitly.
pub fn load_config(root: &Path) -> Result<SyncConfig, ConfigError> {
    let (path, raw) = read_project_file(root)?;
    finish_load(path, raw)
}

/// Load and validate the project config from an explicit file path.
pub fn load_config_at(path: &Path) -> Result<SyncConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    finish_load(path.to_path_buf(), raw)
}

fn finish_load(path: PathBuf, raw: String) -> Result<SyncConfig, ConfigError> {
    let mut cfg: SyncConfig = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?
    } else {
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?
    };

    if let Some(base) = dirs::config_dir() {
        let user_path = base.join("locsync").join("locsync.toml");
        if let Ok(s) = std::fs::read_to_string(&user_path) {
            if let Ok(user) = toml::from_str::<UserConfig>(&s) {
                apply_overlay(&mut cfg.sync, user.sync);
            }
        }
    }

    validate(&cfg)?;
    Ok(cfg)
}

fn read_project_file(root: &Path) -> Result<(PathBuf, String), ConfigError> {
    for name in ["locsync.toml", "locsync.json"] {
        let path = root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(s) => return Ok((path, s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(ConfigError::Io { path, source: e }),
        }
    }
    Err(ConfigError::NotFound(root.to_path_buf()))
}

fn apply_overlay(policy: &mut SyncPolicy, overlay: SyncPolicyOverlay) {
    // Project config wins only where it differs from the defaults; the
    // overlay fills the rest. Mirrors the layered merge of the user config.
    let defaults = SyncPolicy::default();
    macro_rules! fill {
        ($field:ident) => {
            if policy.$field == defaults.$field {
                if let Some(v) = overlay.$field {
                    policy.$field = v;
                }
            }
        };
    }
    fill!(batch_size);
    fill!(max_concurrent_batches);
    fill!(max_parallel_locales);
    fill!(max_attempts);
    fill!(backoff_base_ms);
    fill!(backoff_max_ms);
}

/// Invariants checked before any filesystem or network work.
pub fn validate(cfg: &SyncConfig) -> Result<(), ConfigError> {
    if cfg.locale.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    if cfg.locale.targets.contains(&cfg.locale.source) {
        return Err(ConfigError::SourceInTargets(cfg.locale.source.clone()));
    }
    let mut seen = std::collections::BTreeSet::new();
    for t in &cfg.locale.targets {
        if !seen.insert(t) {
            return Err(ConfigError::DuplicateTarget(t.clone()));
        }
    }
    if cfg.files.is_empty() {
        return Err(ConfigError::NoFileGroups);
    }
    for (group, spec) in &cfg.files {
        if spec.include.is_empty() {
            return Err(ConfigError::EmptyGroup {
                group: group.clone(),
            });
        }
        for template in &spec.include {
            if !template.contains(LOCALE_TOKEN) {
                return Err(ConfigError::TemplateWithoutLocale {
                    group: group.clone(),
                    template: template.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Starter config written by `locsync init`.
pub const STARTER_CONFIG: &str = r#"version = "1.0"

[locale]
source = "en"
targets = ["es"]

[files.json]
include = ["locales/[locale].json"]

[llm]
provider = "openai"
model = "gpt-4-turbo"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn write_cfg(dir: &Path, body: &str) {
        std::fs::write(dir.join("locsync.toml"), body).unwrap();
    }

    #[test]
    fn starter_config_is_valid() {
        let tmp = tempfile::tempdir().unwrap();
        write_cfg(tmp.path(), STARTER_CONFIG);
        let cfg = load_config(tmp.path()).unwrap();
        assert_eq!(cfg.locale.source.as_str(), "en");
        assert_eq!(cfg.locale.targets, vec![LocaleId::from("es")]);
        assert_eq!(cfg.sync.batch_size, 25);
    }

    #[test]
    fn source_listed_as_target_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_cfg(
            tmp.path(),
            r#"version = "1.0"
[locale]
source = "en"
targets = ["es", "en"]
[files.json]
include = ["locales/[locale].json"]
[llm]
provider = "openai"
model = "gpt-4-turbo"
"#,
        );
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::SourceInTargets(_)));
    }

    #[test]
    fn template_without_locale_token_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_cfg(
            tmp.path(),
            r#"version = "1.0"
[locale]
source = "en"
targets = ["es"]
[files.json]
include = ["locales/en.json"]
[llm]
provider = "openai"
model = "gpt-4-turbo"
"#,
        );
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateWithoutLocale { .. }));
    }

    #[test]
    fn overlay_fills_only_defaulted_fields() {
        let mut policy = SyncPolicy {
            batch_size: 10,
            ..SyncPolicy::default()
        };
        apply_overlay(
            &mut policy,
            SyncPolicyOverlay {
                batch_size: Some(50),
                max_attempts: Some(7),
                ..SyncPolicyOverlay::default()
            },
        );
        assert_eq!(policy.batch_size, 10, "project config wins");
        assert_eq!(policy.max_attempts, 7, "overlay fills the default");
    }

    #[test]
    fn json_config_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("locsync.json"),
            r#"{
  "version": "1.0",
  "locale": { "source": "en", "targets": ["es", "fr"] },
  "files": { "json": { "include": ["locales/[locale].json"] } },
  "llm": { "provider": "openai", "model": "gpt-4-turbo" }
}"#,
        )
        .unwrap();
        let cfg = load_config(tmp.path()).unwrap();
        assert_eq!(cfg.locale.targets.len(), 2);
    }
}
