//! Merger: applies accepted translations and removals to a target tree and
//! writes the result back. Every leaf the diff did not touch stays exactly
//! as it was, which is what makes repeated runs idempotent.

use std::path::Path;

use tracing::debug;

use locsync_core::{ContentNode, KeyPath};

use crate::orchestrator::AcceptedUnit;
use crate::{util, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// Serialized bytes equal the bytes on disk; nothing written.
    Skipped,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Created => "created",
            WriteOutcome::Updated => "updated",
            WriteOutcome::Skipped => "skipped",
        }
    }
}

/// Apply accepted units (already re-ordered to source order, so appended
/// keys land in source order) and removals to the tree in place.
pub fn apply_to_tree(tree: &mut ContentNode, accepted: &[AcceptedUnit], removed: &[KeyPath]) {
    for a in accepted {
        tree.set_text(&a.unit.key_path, a.text.clone());
    }
    for key_path in removed {
        tree.remove(key_path);
    }
}

/// Serialize `tree` with `adapter` and write it atomically. Skips the write
/// when the file already holds exactly these bytes, so untouched files stay
/// byte-identical across runs.
pub fn write_back(
    adapter: &dyn locsync_formats::FormatAdapter,
    abs_path: &Path,
    tree: &ContentNode,
) -> Result<WriteOutcome, SyncError> {
    let bytes = adapter.serialize(tree)?;
    let existed = abs_path.exists();
    if existed {
        if let Ok(old) = std::fs::read(abs_path) {
            if old == bytes {
                return Ok(WriteOutcome::Skipped);
            }
        }
    }
    util::write_atomic(abs_path, &bytes).map_err(|e| SyncError::MergeWrite {
        path: abs_path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %abs_path.display(), "target file written");
    Ok(if existed {
        WriteOutcome::Updated
    } else {
        WriteOutcome::Created
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use locsync_core::TranslationUnit;

    fn kp(segs: &[&str]) -> KeyPath {
        KeyPath(segs.iter().map(|s| s.to_string()).collect())
    }

    fn accepted(segs: &[&str], source: &str, text: &str) -> AcceptedUnit {
        AcceptedUnit {
            unit: TranslationUnit::new(kp(segs), source),
            text: text.to_string(),
        }
    }

    #[test]
    fn untouched_siblings_stay_in_place() {
        let mut tree = ContentNode::empty_branch();
        tree.set_text(&kp(&["a"]), "uno");
        tree.set_text(&kp(&["b"]), "dos");
        apply_to_tree(&mut tree, &[accepted(&["c"], "three", "tres")], &[]);
        let keys: Vec<&String> = tree.as_branch().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(tree.get(&kp(&["a"])), Some(&ContentNode::Text("uno".into())));
    }

    #[test]
    fn removals_prune_empty_branches() {
        let mut tree = ContentNode::empty_branch();
        tree.set_text(&kp(&["menu", "open"]), "Abrir");
        tree.set_text(&kp(&["title"]), "App");
        apply_to_tree(&mut tree, &[], &[kp(&["menu", "open"])]);
        assert!(tree.get(&kp(&["menu"])).is_none());
        assert!(tree.get(&kp(&["title"])).is_some());
    }

    #[test]
    fn write_back_skips_identical_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("es.json");
        let adapter = locsync_formats::adapter_for("json").unwrap();
        let mut tree = ContentNode::empty_branch();
        tree.set_text(&kp(&["greeting"]), "Hola");

        assert_eq!(write_back(adapter, &path, &tree).unwrap(), WriteOutcome::Created);
        assert_eq!(write_back(adapter, &path, &tree).unwrap(), WriteOutcome::Skipped);

        tree.set_text(&kp(&["greeting"]), "Buenas");
        assert_eq!(write_back(adapter, &path, &tree).unwrap(), WriteOutcome::Updated);
    }
}
