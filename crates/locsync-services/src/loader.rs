//! Locale file loading: resolves the config's path templates for a locale,
//! globs the filesystem and parses every match through the format adapter
//! registered for the group's tag.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use locsync_config::{SyncConfig, LOCALE_TOKEN};
use locsync_core::{ContentNode, LocaleId};
use locsync_formats::adapter_for;

use crate::{util::normalize_rel_path, SyncError};

/// One parsed locale file with enough context to find its counterpart in
/// another locale.
#[derive(Debug, Clone)]
pub struct LocaleFile {
    /// Format tag of the file group this file came from.
    pub group: String,
    /// Path relative to the project root, forward slashes.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub tree: ContentNode,
}

/// Substitute the `[locale]` placeholder in a path template.
pub fn resolve_template(template: &str, locale: &LocaleId) -> String {
    template.replace(LOCALE_TOKEN, locale.as_str())
}

/// Load every file group for the source locale. A template with zero matches
/// is fatal for its group but the remaining groups still load; group-level
/// failures come back alongside the files so the caller can report them.
pub fn load_source_locale(
    root: &Path,
    cfg: &SyncConfig,
) -> Result<(Vec<LocaleFile>, Vec<SyncError>), SyncError> {
    let mut files = Vec::new();
    let mut group_errors = Vec::new();

    for (group, spec) in &cfg.files {
        let adapter = adapter_for(group)?;
        for template in &spec.include {
            let resolved = resolve_template(template, &cfg.locale.source);
            let pattern = root.join(&resolved).to_string_lossy().into_owned();
            let matches = glob::glob(&pattern).map_err(|e| SyncError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;

            let mut matched_any = false;
            for entry in matches {
                let abs_path = match entry {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(pattern = %pattern, "unreadable glob match: {e}");
                        continue;
                    }
                };
                if !abs_path.is_file() {
                    continue;
                }
                matched_any = true;
                let bytes = std::fs::read(&abs_path).map_err(|e| SyncError::ReadFile {
                    path: abs_path.clone(),
                    source: e,
                })?;
                let tree = adapter.parse(&bytes)?;
                let rel = abs_path.strip_prefix(root).unwrap_or(&abs_path);
                debug!(group = %group, path = %rel.display(), "loaded source file");
                files.push(LocaleFile {
                    group: group.clone(),
                    rel_path: normalize_rel_path(rel),
                    abs_path,
                    tree,
                });
            }

            if !matched_any {
                group_errors.push(SyncError::MissingSourceFile {
                    group: group.clone(),
                    template: template.clone(),
                });
            }
        }
    }

    Ok((files, group_errors))
}

/// The target-locale counterpart of a source file: same path with the
/// locale-valued components retargeted. Missing target files are not an
/// error; they come back as an empty tree to be created on first sync.
pub fn target_file_for(
    root: &Path,
    source_file: &LocaleFile,
    source: &LocaleId,
    target: &LocaleId,
) -> Result<LocaleFile, SyncError> {
    let adapter = adapter_for(&source_file.group)?;
    let rel_path = retarget_rel_path(&source_file.rel_path, source, target);
    let abs_path = root.join(&rel_path);
    let tree = match std::fs::read(&abs_path) {
        Ok(bytes) => adapter.parse(&bytes)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ContentNode::empty_branch(),
        Err(e) => {
            return Err(SyncError::ReadFile {
                path: abs_path,
                source: e,
            })
        }
    };
    Ok(LocaleFile {
        group: source_file.group.clone(),
        rel_path,
        abs_path,
        tree,
    })
}

/// Swap the source locale for the target locale wherever it appears as a
/// whole path component or as a file stem ("locales/en/app.json",
/// "locales/en.json").
pub fn retarget_rel_path(rel: &str, source: &LocaleId, target: &LocaleId) -> String {
    let src = source.as_str();
    rel.split('/')
        .map(|component| {
            if component == src {
                return target.as_str().to_string();
            }
            match component.rsplit_once('.') {
                Some((stem, ext)) if stem == src => format!("{target}.{ext}"),
                _ => component.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_resolution_substitutes_locale() {
        assert_eq!(
            resolve_template("locales/[locale].json", &LocaleId::from("en")),
            "locales/en.json"
        );
    }

    #[test]
    fn retarget_swaps_stem_and_component() {
        let en = LocaleId::from("en");
        let es = LocaleId::from("es");
        assert_eq!(retarget_rel_path("locales/en.json", &en, &es), "locales/es.json");
        assert_eq!(
            retarget_rel_path("locales/en/common.json", &en, &es),
            "locales/es/common.json"
        );
        assert_eq!(
            retarget_rel_path("locales/native/en.json", &en, &es),
            "locales/native/es.json"
        );
    }

    #[test]
    fn retarget_leaves_lookalike_components_alone() {
        let en = LocaleId::from("en");
        let es = LocaleId::from("es");
        assert_eq!(
            retarget_rel_path("locales/enlisted/end.json", &en, &es),
            "locales/enlisted/end.json"
        );
    }
}
