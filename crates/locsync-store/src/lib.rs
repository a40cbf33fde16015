//! Persisted fingerprint store: the only durable state the pipeline owns.
//!
//! One JSON document per target locale under `<root>/.locsync/`, keyed by
//! file path (relative, forward slashes) and then by key path. A record
//! exists only for keys that have been successfully translated and written
//! back at least once; the merger commits record updates strictly after a
//! successful file write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use locsync_core::{KeyPath, LocaleId};

pub const STORE_DIR: &str = ".locsync";
pub const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt store {path:?}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Sync state for one (target locale, file, key path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub key_path: KeyPath,
    /// Fingerprint of the source text this key was last translated from.
    pub source_fingerprint: String,
    /// Fingerprint of the translated text that was written back.
    pub translated_fingerprint: String,
    /// Unix seconds.
    pub last_synced_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,
    locale: LocaleId,
    /// Relative file path -> records for that file.
    files: HashMap<String, Vec<FingerprintRecord>>,
}

/// In-memory fingerprint state for one target locale. Locale workers each
/// own their store value, which gives the single-writer-per-locale
/// discipline; `save` is atomic (tmp + rename).
#[derive(Debug)]
pub struct FingerprintStore {
    path: PathBuf,
    locale: LocaleId,
    files: HashMap<String, HashMap<KeyPath, FingerprintRecord>>,
    dirty: bool,
}

impl FingerprintStore {
    /// Load the store for `locale`, or start empty when no file exists yet.
    pub fn load(root: &Path, locale: &LocaleId) -> Result<Self, StoreError> {
        let path = root.join(STORE_DIR).join(format!("{locale}.json"));
        let files = match std::fs::read(&path) {
            Ok(bytes) => {
                let doc: StoreDocument =
                    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                doc.files
                    .into_iter()
                    .map(|(file, records)| {
                        let by_key = records
                            .into_iter()
                            .map(|r| (r.key_path.clone(), r))
                            .collect();
                        (file, by_key)
                    })
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Read { path, source: e }),
        };
        Ok(FingerprintStore {
            path,
            locale: locale.clone(),
            files,
            dirty: false,
        })
    }

    pub fn locale(&self) -> &LocaleId {
        &self.locale
    }

    /// Records for one file, empty map when the file was never synced.
    pub fn records_for(&self, file: &str) -> HashMap<KeyPath, FingerprintRecord> {
        self.files.get(file).cloned().unwrap_or_default()
    }

    /// Commit a successful translation of `key_path` in `file`.
    pub fn upsert(
        &mut self,
        file: &str,
        key_path: KeyPath,
        source_fingerprint: String,
        translated_fingerprint: String,
    ) {
        let record = FingerprintRecord {
            key_path: key_path.clone(),
            source_fingerprint,
            translated_fingerprint,
            last_synced_at: now_unix(),
        };
        self.files
            .entry(file.to_string())
            .or_default()
            .insert(key_path, record);
        self.dirty = true;
    }

    /// Purge the record for a key removed from the source.
    pub fn remove(&mut self, file: &str, key_path: &KeyPath) {
        if let Some(by_key) = self.files.get_mut(file) {
            if by_key.remove(key_path).is_some() {
                self.dirty = true;
            }
            if by_key.is_empty() {
                self.files.remove(file);
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Atomically persist the store (write to a sibling tmp file, then
    /// rename over the target).
    pub fn save(&mut self) -> Result<(), StoreError> {
        let mut files: HashMap<String, Vec<FingerprintRecord>> = HashMap::new();
        for (file, by_key) in &self.files {
            let mut records: Vec<FingerprintRecord> = by_key.values().cloned().collect();
            records.sort_by(|a, b| a.key_path.cmp(&b.key_path));
            files.insert(file.clone(), records);
        }
        let doc = StoreDocument {
            schema_version: STORE_SCHEMA_VERSION,
            locale: self.locale.clone(),
            files,
        };
        let bytes = serde_json::to_vec_pretty(&doc).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &bytes).map_err(|e| StoreError::Write {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(locale = %self.locale, path = %self.path.display(), "fingerprint store saved");
        self.dirty = false;
        Ok(())
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(segs: &[&str]) -> KeyPath {
        KeyPath(segs.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn store_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let locale = LocaleId::from("es");
        let mut store = FingerprintStore::load(tmp.path(), &locale).unwrap();
        store.upsert("locales/es.json", kp(&["greeting"]), "src-fp".into(), "trg-fp".into());
        store.save().unwrap();

        let reloaded = FingerprintStore::load(tmp.path(), &locale).unwrap();
        let records = reloaded.records_for("locales/es.json");
        let rec = records.get(&kp(&["greeting"])).unwrap();
        assert_eq!(rec.source_fingerprint, "src-fp");
        assert_eq!(rec.translated_fingerprint, "trg-fp");
    }

    #[test]
    fn remove_purges_record_and_empty_file_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let locale = LocaleId::from("es");
        let mut store = FingerprintStore::load(tmp.path(), &locale).unwrap();
        store.upsert("locales/es.json", kp(&["farewell"]), "a".into(), "b".into());
        store.remove("locales/es.json", &kp(&["farewell"]));
        store.save().unwrap();

        let reloaded = FingerprintStore::load(tmp.path(), &locale).unwrap();
        assert!(reloaded.records_for("locales/es.json").is_empty());
    }

    #[test]
    fn save_leaves_no_tmp_file_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let locale = LocaleId::from("de");
        let mut store = FingerprintStore::load(tmp.path(), &locale).unwrap();
        store.upsert("l/de.json", kp(&["k"]), "s".into(), "t".into());
        store.save().unwrap();
        let dir = tmp.path().join(STORE_DIR);
        let entries: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, ["de.json"]);
    }

    #[test]
    fn missing_store_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FingerprintStore::load(tmp.path(), &LocaleId::from("fr")).unwrap();
        assert!(store.records_for("anything.json").is_empty());
        assert!(!store.is_dirty());
    }
}
