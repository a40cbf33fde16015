//! Diff engine: classify every source unit against the target locale's
//! stored fingerprints and its current tree.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use locsync_core::{ContentNode, KeyPath, TranslationUnit};
use locsync_store::FingerprintRecord;

/// Partition of the source unit set plus orphaned records for one file.
/// The four sets are disjoint.
#[derive(Debug, Default)]
pub struct FileDiff {
    /// No fingerprint record for this key in the target locale.
    pub added: Vec<TranslationUnit>,
    /// Record exists but the source changed since the last sync, or the
    /// translated leaf in the target tree lost its shape.
    pub changed: Vec<TranslationUnit>,
    /// Fingerprints match and the target still holds the leaf; no provider
    /// call for these.
    pub unchanged: Vec<KeyPath>,
    /// Record exists but the key left the source; the target leaf is to be
    /// deleted and the record purged.
    pub removed: Vec<KeyPath>,
}

pub fn classify(
    source_units: &[TranslationUnit],
    target_tree: &ContentNode,
    records: &HashMap<KeyPath, FingerprintRecord>,
) -> FileDiff {
    let mut diff = FileDiff::default();
    let mut source_keys: HashSet<&KeyPath> = HashSet::with_capacity(source_units.len());

    for unit in source_units {
        source_keys.insert(&unit.key_path);
        match records.get(&unit.key_path) {
            None => diff.added.push(unit.clone()),
            Some(record) if record.source_fingerprint != unit.fingerprint => {
                diff.changed.push(unit.clone())
            }
            Some(_) => {
                // Fingerprints match; still re-translate when the target no
                // longer holds a text leaf there (deleted by hand, or the
                // node shape flipped between leaf and branch).
                match target_tree.get(&unit.key_path) {
                    Some(node) if node.is_text() => diff.unchanged.push(unit.key_path.clone()),
                    _ => diff.changed.push(unit.clone()),
                }
            }
        }
    }

    for key_path in records.keys() {
        if !source_keys.contains(key_path) {
            diff.removed.push(key_path.clone());
        }
    }
    diff.removed.sort();

    debug!(
        added = diff.added.len(),
        changed = diff.changed.len(),
        unchanged = diff.unchanged.len(),
        removed = diff.removed.len(),
        "diff classified"
    );
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use locsync_core::fingerprint;

    fn kp(segs: &[&str]) -> KeyPath {
        KeyPath(segs.iter().map(|s| s.to_string()).collect())
    }

    fn unit(segs: &[&str], text: &str) -> TranslationUnit {
        TranslationUnit::new(kp(segs), text)
    }

    fn record(segs: &[&str], source_text: &str) -> (KeyPath, FingerprintRecord) {
        (
            kp(segs),
            FingerprintRecord {
                key_path: kp(segs),
                source_fingerprint: fingerprint(source_text),
                translated_fingerprint: fingerprint("whatever"),
                last_synced_at: 0,
            },
        )
    }

    #[test]
    fn unit_without_record_is_added() {
        let diff = classify(
            &[unit(&["greeting"], "Hello {name}")],
            &ContentNode::empty_branch(),
            &HashMap::new(),
        );
        assert_eq!(diff.added.len(), 1);
        assert!(diff.changed.is_empty() && diff.removed.is_empty());
    }

    #[test]
    fn fingerprint_mismatch_is_changed() {
        let records = HashMap::from([record(&["greeting"], "Hello {name}")]);
        let mut target = ContentNode::empty_branch();
        target.set_text(&kp(&["greeting"]), "Hola {name}");
        let diff = classify(
            &[unit(&["greeting"], "Hi {name}")],
            &target,
            &records,
        );
        assert_eq!(diff.changed.len(), 1);
        assert!(diff.added.is_empty() && diff.unchanged.is_empty());
    }

    #[test]
    fn matching_fingerprint_with_target_leaf_is_unchanged() {
        let records = HashMap::from([record(&["greeting"], "Hello {name}")]);
        let mut target = ContentNode::empty_branch();
        target.set_text(&kp(&["greeting"]), "Hola {name}");
        let diff = classify(&[unit(&["greeting"], "Hello {name}")], &target, &records);
        assert_eq!(diff.unchanged.len(), 1);
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn matching_fingerprint_without_target_leaf_is_changed() {
        let records = HashMap::from([record(&["greeting"], "Hello {name}")]);
        let diff = classify(
            &[unit(&["greeting"], "Hello {name}")],
            &ContentNode::empty_branch(),
            &records,
        );
        assert_eq!(diff.changed.len(), 1, "lost target leaf must re-translate");
    }

    #[test]
    fn shape_flip_in_target_is_changed_never_unchanged() {
        let records = HashMap::from([record(&["greeting"], "Hello")]);
        let mut target = ContentNode::empty_branch();
        // "greeting" became a branch in the target.
        target.set_text(&kp(&["greeting", "formal"]), "Buenos días");
        let diff = classify(&[unit(&["greeting"], "Hello")], &target, &records);
        assert_eq!(diff.changed.len(), 1);
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn orphaned_record_is_removed() {
        let records = HashMap::from([
            record(&["greeting"], "Hello"),
            record(&["farewell"], "Bye"),
        ]);
        let mut target = ContentNode::empty_branch();
        target.set_text(&kp(&["greeting"]), "Hola");
        target.set_text(&kp(&["farewell"]), "Adiós");
        let diff = classify(&[unit(&["greeting"], "Hello")], &target, &records);
        assert_eq!(diff.removed, vec![kp(&["farewell"])]);
    }
}
