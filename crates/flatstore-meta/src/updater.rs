//! Applies record inserts and deletes to the primary-key sets.
//!
//! The file is re-read on every call, changed in memory, written to
//! `<meta>.temp` and renamed over the original. Nothing is written if any
//! change fails.

use crate::{KeySet, MetaReader};
use flatstore_core::format::write_atomic;
use flatstore_core::{Error, Record, Result, SyncMode, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::trace;

/// Rewrites the key-set section of one metadata file.
#[derive(Debug, Clone)]
pub struct MetaUpdater {
    reader: MetaReader,
    sync_mode: SyncMode,
}

impl MetaUpdater {
    /// Updater for the metadata file belonging to `record_path`.
    pub fn for_record_file(record_path: &Path, sync_mode: SyncMode) -> Self {
        Self {
            reader: MetaReader::for_record_file(record_path),
            sync_mode,
        }
    }

    /// Removes the primary keys of `deleted` and adds those of `inserted`.
    ///
    /// Records without a value for a key field contribute nothing to it.
    /// Removing a value that is not in the key set fails with
    /// [`Error::KeyNotPresent`].
    pub fn apply(&self, deleted: &[Record], inserted: &[Record]) -> Result<()> {
        let mut doc = self.reader.load_document()?;
        let primary_keys: Vec<String> = doc.schema().primary_keys().map(str::to_string).collect();

        for field in &primary_keys {
            let to_remove = collect_keys(field, deleted)?;
            let to_add = collect_keys(field, inserted)?;
            if to_remove.is_empty() && to_add.is_empty() {
                continue;
            }

            let Some(keys) = doc.key_set_mut(field) else {
                continue;
            };
            for value in &to_remove {
                if !keys.remove(value) {
                    return Err(Error::KeyNotPresent {
                        field: field.clone(),
                        value: *value,
                    });
                }
            }
            keys.extend(to_add.iter().copied());
            trace!(
                field = %field,
                removed = to_remove.len(),
                added = to_add.len(),
                "Updating key set"
            );
        }

        write_atomic(self.reader.path(), &doc.render(), self.sync_mode)
    }

    /// Current key sets, freshly loaded. Mostly useful for consistency checks.
    pub fn key_sets(&self) -> Result<HashMap<String, KeySet>> {
        Ok(self.reader.load_document()?.info().key_sets)
    }
}

fn collect_keys(field: &str, records: &[Record]) -> Result<KeySet> {
    let mut keys = KeySet::new();
    for record in records {
        if let Some(value) = record.get(field).filter(|v| !v.is_falsy()) {
            keys.insert(key_of(field, value)?);
        }
    }
    Ok(keys)
}

fn key_of(field: &str, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Int(v) => u64::try_from(*v).ok(),
        Value::Text(s) => s.parse::<u64>().ok(),
    };
    parsed.ok_or_else(|| {
        Error::Malformed(format!(
            "value {:?} of primary-key field {} is not a positive integer",
            value.to_text(),
            field
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetaSource;
    use flatstore_core::format::meta_path;
    use flatstore_core::{FieldValues, Record};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    const SPEC: [&str; 3] = ["id1", "id2", "pok"];

    fn setup() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let record_path = dir.path().join("test.sbstore");
        fs::write(
            meta_path(&record_path),
            "id1[pk] id2[pk] pok\n#hashes\nid1 1 3 4\nid2 8 9\n#endhashes",
        )
        .unwrap();
        (dir, record_path)
    }

    fn record(id1: i64, id2: i64, pok: &str) -> Record {
        let fields: Arc<[String]> = SPEC.iter().map(|s| s.to_string()).collect();
        Record::build(
            fields,
            &[],
            &FieldValues::new().with("id1", id1).with("id2", id2).with("pok", pok),
        )
    }

    fn sets(record_path: &Path) -> (Vec<u64>, Vec<u64>) {
        let info = MetaReader::for_record_file(record_path).load().unwrap();
        (
            info.key_set("id1").unwrap().iter().copied().collect(),
            info.key_set("id2").unwrap().iter().copied().collect(),
        )
    }

    #[test]
    fn test_meta_updater_insert() {
        let (_dir, path) = setup();
        let updater = MetaUpdater::for_record_file(&path, SyncMode::Sync);

        updater.apply(&[], &[record(7, 2, "kek")]).unwrap();

        assert_eq!(sets(&path), (vec![1, 3, 4, 7], vec![2, 8, 9]));
    }

    #[test]
    fn test_meta_updater_delete() {
        let (_dir, path) = setup();
        let updater = MetaUpdater::for_record_file(&path, SyncMode::Sync);

        updater.apply(&[record(1, 8, "olo")], &[]).unwrap();

        assert_eq!(sets(&path), (vec![3, 4], vec![9]));
    }

    #[test]
    fn test_meta_updater_delete_and_insert() {
        let (_dir, path) = setup();
        let updater = MetaUpdater::for_record_file(&path, SyncMode::Sync);

        updater
            .apply(&[record(1, 8, "olo")], &[record(7, 2, "kek")])
            .unwrap();

        assert_eq!(sets(&path), (vec![3, 4, 7], vec![2, 9]));
    }

    #[test]
    fn test_deleting_absent_key_fails_without_writing() {
        let (_dir, path) = setup();
        let updater = MetaUpdater::for_record_file(&path, SyncMode::Sync);
        let before = fs::read_to_string(meta_path(&path)).unwrap();

        let err = updater.apply(&[record(2, 8, "x")], &[]).unwrap_err();

        assert!(matches!(err, Error::KeyNotPresent { value: 2, .. }));
        assert_eq!(fs::read_to_string(meta_path(&path)).unwrap(), before);
    }

    #[test]
    fn test_text_keys_from_stored_records() {
        let (_dir, path) = setup();
        let updater = MetaUpdater::for_record_file(&path, SyncMode::None);
        let fields: Arc<[String]> = SPEC.iter().map(|s| s.to_string()).collect();
        let stored = Record::from_tokens(fields, ["3", "9", "olo"]);

        updater.apply(&[stored], &[]).unwrap();

        assert_eq!(sets(&path), (vec![1, 4], vec![8]));
    }

    #[test]
    fn test_header_and_temp_file() {
        let (_dir, path) = setup();
        let updater = MetaUpdater::for_record_file(&path, SyncMode::Sync);

        updater.apply(&[], &[record(5, 6, "p")]).unwrap();

        let text = fs::read_to_string(meta_path(&path)).unwrap();
        assert!(text.starts_with("id1[pk] id2[pk] pok\n#hashes\n"));
        assert!(text.ends_with("#endhashes\n"));
        assert!(!flatstore_core::format::temp_path(&meta_path(&path)).exists());
        assert_eq!(updater.key_sets().unwrap()["id1"].len(), 4);
    }
}
