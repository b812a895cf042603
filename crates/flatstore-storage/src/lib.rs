//! # FlatStore Storage Engine
//!
//! The sub-store engine: one schema, one record file and one metadata file
//! addressed by a name.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of FlatStore.**
//!
//! Users should depend on the main `flatstore` crate instead, which provides
//! the stable public API. This crate's API may change without notice between
//! minor versions.
//!
//! ---
//!
//! Every mutation runs the same pipeline:
//!
//! ```text
//! load metadata → validate → auto-fill (insert) → record file I/O → update key sets
//! ```
//!
//! ## Concurrency
//!
//! Operations are synchronous and take no locks. Record files and metadata
//! files are replaced through temp files, so a reader never sees a partial
//! file, but two concurrent writers on the same sub-store can leave the key
//! sets out of step with the record file. Embedding applications that mutate
//! a sub-store from more than one thread or process must serialize those
//! writers themselves (one writer per sub-store at a time).

use flatstore_core::format::{
    next_line, open_for_append, read_until_sentinel, replace_file, sync_file, temp_path,
    write_line, RECORDS_START,
};
use flatstore_core::{build_record, Error, FieldValues, Record, Result, SyncMode, Value};
use flatstore_meta::{MetaInfo, MetaReader, MetaSource, MetaUpdater};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod autofill;
pub mod creator;
pub mod records;
pub mod validator;

pub use autofill::AutoFiller;
pub use creator::{record_path_in, validate_name, SubStoreCreator};
pub use records::RecordIter;
pub use validator::FieldValidator;

/// Sub-store configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SubStoreConfig {
    /// Durability of record and metadata writes
    pub sync_mode: SyncMode,
}

/// A named, schema-bound record collection.
///
/// Holds only paths; metadata is loaded fresh for every operation.
#[derive(Debug, Clone)]
pub struct SubStore {
    name: String,
    path: PathBuf,
    meta: MetaReader,
    updater: MetaUpdater,
    config: SubStoreConfig,
}

impl SubStore {
    /// Opens the sub-store whose record file is `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, SubStoreConfig::default())
    }

    /// Opens a sub-store with custom configuration.
    ///
    /// Both files must already exist.
    pub fn open_with_config(path: impl AsRef<Path>, config: SubStoreConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let meta = MetaReader::for_record_file(&path);
        fs::metadata(&path)?;
        fs::metadata(meta.path())?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            updater: MetaUpdater::for_record_file(&path, config.sync_mode),
            meta,
            path,
            config,
        })
    }

    /// Sub-store name (record file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata file path.
    pub fn meta_path(&self) -> &Path {
        self.meta.path()
    }

    /// Fresh metadata snapshot.
    pub fn meta(&self) -> Result<MetaInfo> {
        self.meta.load()
    }

    /// Field names in declared order.
    pub fn spec(&self) -> Result<Vec<String>> {
        Ok(self.meta()?.fields().to_vec())
    }

    /// Inserts one record and returns the number of records written (1).
    ///
    /// Positional values bind to schema order, named values override them.
    /// Missing or falsy primary keys are auto-filled; other missing fields
    /// are written as `None`. Every primary-key value, supplied or filled,
    /// is validated before the record file is opened.
    pub fn insert_one(&self, positional: &[Value], named: &FieldValues) -> Result<usize> {
        let meta = self.meta()?;
        let validator = FieldValidator::new(&meta);
        validator.check(named, true)?;
        for (field, value) in meta.fields().iter().zip(positional) {
            if named.get(field).is_none() && !value.is_falsy() {
                validator.validate(field, value, true)?;
            }
        }

        let record = build_record(meta.fields(), positional, named);
        let record = AutoFiller::new(&meta).fill(record)?;
        for field in meta.schema.primary_keys() {
            match record.get(field) {
                Some(value) => validator.validate(field, value, true)?,
                None => return Err(Error::Malformed(format!("primary key {} left empty", field))),
            }
        }
        let line = records::encode_line(&record)?;

        {
            let mut file = open_for_append(&self.path)?;
            write_line(&mut file, &line)?;
            sync_file(&file, self.config.sync_mode)?;
        }
        self.updater.apply(&[], std::slice::from_ref(&record))?;

        debug!(sub_store = %self.name, record = %record, "Inserted record");
        Ok(1)
    }

    /// First record matching every condition, in file order.
    pub fn get_one(&self, conditions: &FieldValues) -> Result<Option<Record>> {
        let found = self.lazy_load(conditions)?.next().transpose()?;
        debug!(
            sub_store = %self.name,
            conditions = conditions.len(),
            found = found.is_some(),
            "get_one"
        );
        Ok(found)
    }

    /// All records matching every condition, in file order.
    ///
    /// Empty conditions match every record.
    pub fn get_many(&self, conditions: &FieldValues) -> Result<Vec<Record>> {
        let records = self.lazy_load(conditions)?.collect::<Result<Vec<_>>>()?;
        debug!(
            sub_store = %self.name,
            conditions = conditions.len(),
            matched = records.len(),
            "get_many"
        );
        Ok(records)
    }

    /// Every record, in file order.
    pub fn get_all(&self) -> Result<Vec<Record>> {
        self.get_many(&FieldValues::new())
    }

    /// Lazily scans for matching records.
    ///
    /// Conditions are validated up front; the returned iterator owns the
    /// file handle until it is exhausted or dropped.
    pub fn lazy_load(&self, conditions: &FieldValues) -> Result<RecordIter> {
        let meta = self.meta()?;
        FieldValidator::new(&meta).check(conditions, false)?;
        RecordIter::open(&self.path, meta.schema.field_list(), conditions.clone())
    }

    /// Deletes the first record matching every condition.
    ///
    /// Returns 1 if a record was removed and 0 otherwise. The record file is
    /// rewritten through a temp file; with no match both files stay as they
    /// were.
    pub fn delete_one(&self, conditions: &FieldValues) -> Result<usize> {
        let meta = self.meta()?;
        FieldValidator::new(&meta).check(conditions, false)?;

        let temp = temp_path(&self.path);
        let deleted = match self.rewrite_without_first_match(&meta, conditions, &temp) {
            Ok(deleted) => deleted,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(e);
            }
        };

        let Some(record) = deleted else {
            fs::remove_file(&temp)?;
            debug!(sub_store = %self.name, conditions = conditions.len(), "delete_one: no match");
            return Ok(0);
        };

        replace_file(&self.path, &temp, self.config.sync_mode)?;
        self.updater.apply(std::slice::from_ref(&record), &[])?;

        debug!(sub_store = %self.name, record = %record, "Deleted record");
        Ok(1)
    }

    /// Copies the record file to `temp`, leaving out the first match.
    fn rewrite_without_first_match(
        &self,
        meta: &MetaInfo,
        conditions: &FieldValues,
        temp: &Path,
    ) -> Result<Option<Record>> {
        let fields = meta.schema.field_list();
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut writer = BufWriter::new(File::create(temp)?);

        for line in read_until_sentinel(&mut reader, RECORDS_START)? {
            write_line(&mut writer, &line)?;
        }
        write_line(&mut writer, RECORDS_START)?;

        let mut deleted = None;
        while let Some(line) = next_line(&mut reader)? {
            let Some(record) = records::parse_line(&fields, &line)? else {
                continue;
            };
            if deleted.is_none() && record.matches(conditions) {
                deleted = Some(record);
            } else {
                write_line(&mut writer, &line)?;
            }
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        sync_file(&file, self.config.sync_mode)?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatstore_core::format::meta_path;
    use tempfile::{tempdir, TempDir};

    fn setup(records: &str, meta: &str) -> (TempDir, SubStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sbstore");
        fs::write(&path, records).unwrap();
        fs::write(meta_path(&path), meta).unwrap();
        let store = SubStore::open(&path).unwrap();
        (dir, store)
    }

    fn students() -> (TempDir, SubStore) {
        setup(
            "#records\n1 dan kolo\n2 didhat jojo\n3 kadim varpov\n4 kadim karpov\n",
            "student_id[pk] name surname\n#hashes\nstudent_id 1 2 3 4\n#endhashes\n",
        )
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.text("student_id").unwrap()).collect()
    }

    #[test]
    fn test_spec_and_name() {
        let (_dir, store) = students();
        assert_eq!(store.spec().unwrap(), vec!["student_id", "name", "surname"]);
        assert_eq!(store.name(), "test");
    }

    #[test]
    fn test_open_missing_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            SubStore::open(dir.path().join("none.sbstore")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_get_one_without_conditions() {
        let (_dir, store) = students();
        let record = store.get_one(&FieldValues::new()).unwrap().unwrap();
        assert_eq!(record.text("student_id").as_deref(), Some("1"));
        assert_eq!(record.text("name").as_deref(), Some("dan"));
        assert_eq!(record.text("surname").as_deref(), Some("kolo"));
    }

    #[test]
    fn test_get_one_with_conditions() {
        let (_dir, store) = students();
        let record = store
            .get_one(&FieldValues::new().with("name", "kadim").with("surname", "varpov"))
            .unwrap()
            .unwrap();
        assert_eq!(record.text("student_id").as_deref(), Some("3"));
    }

    #[test]
    fn test_get_one_without_matches() {
        let (_dir, store) = students();
        let found = store
            .get_one(&FieldValues::new().with("student_id", 31413121))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_get_with_unknown_field() {
        let (_dir, store) = students();
        let conditions = FieldValues::new().with("non_exist_field", "test");
        assert!(matches!(store.get_one(&conditions), Err(Error::UnknownField(_))));
        assert!(matches!(store.get_many(&conditions), Err(Error::UnknownField(_))));
        assert!(matches!(store.lazy_load(&conditions), Err(Error::UnknownField(_))));
    }

    #[test]
    fn test_get_many() {
        let (_dir, store) = students();
        assert_eq!(ids(&store.get_all().unwrap()), vec!["1", "2", "3", "4"]);
        assert_eq!(
            ids(&store.get_many(&FieldValues::new().with("name", "kadim")).unwrap()),
            vec!["3", "4"]
        );
        assert!(store
            .get_many(&FieldValues::new().with("name", "dododo"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_lazy_load() {
        let (_dir, store) = students();
        let mut iter = store.lazy_load(&FieldValues::new().with("name", "kadim")).unwrap();
        assert_eq!(iter.next().unwrap().unwrap().text("surname").as_deref(), Some("varpov"));
        assert_eq!(iter.next().unwrap().unwrap().text("surname").as_deref(), Some("karpov"));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_insert_positional_and_named() {
        let (_dir, store) = setup("#records", "id name kotlin\n#hashes\n#endhashes");

        assert_eq!(
            store
                .insert_one(&["1".into(), "dan".into(), "ok".into()], &FieldValues::new())
                .unwrap(),
            1
        );
        store
            .insert_one(&["4".into(), "vasya".into(), "yes".into()], &FieldValues::new().with("name", "vanya"))
            .unwrap();

        let record = store.get_one(&FieldValues::new().with("id", "4")).unwrap().unwrap();
        assert_eq!(record.text("name").as_deref(), Some("vanya"));
        assert_eq!(record.text("kotlin").as_deref(), Some("yes"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "#records\n1 dan ok\n4 vanya yes\n");
    }

    #[test]
    fn test_insert_missing_fields_written_as_none() {
        let (_dir, store) = setup("#records", "id name kotlin\n#hashes\n#endhashes");

        store
            .insert_one(&[], &FieldValues::new().with("name", "moro"))
            .unwrap();

        let record = store.get_one(&FieldValues::new()).unwrap().unwrap();
        assert_eq!(record.text("name").as_deref(), Some("moro"));
        assert_eq!(record.text("id").as_deref(), Some("None"));
        assert_eq!(record.text("kotlin").as_deref(), Some("None"));
    }

    #[test]
    fn test_insert_auto_fills_and_updates_meta() {
        let (_dir, store) = setup(
            "#records\n1 dan\n2 max\n3 vadim",
            "id[pk] name\n#hashes\nid 1 2 3\n#endhashes",
        );

        store
            .insert_one(&[], &FieldValues::new().with("name", "jojo"))
            .unwrap();

        let record = store.get_one(&FieldValues::new().with("id", 4)).unwrap().unwrap();
        assert_eq!(record.text("name").as_deref(), Some("jojo"));
        assert!(store.meta().unwrap().key_set("id").unwrap().contains(&4));
    }

    #[test]
    fn test_insert_duplicate_key_touches_nothing() {
        let (_dir, store) = setup(
            "#records\n1 dan\n",
            "id[pk] name\n#hashes\nid 1\n#endhashes\n",
        );
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store
            .insert_one(&[], &FieldValues::new().with("id", 1).with("name", "jojo"))
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateKey { value: 1, .. }));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_positional_duplicate_key_rejected() {
        let (_dir, store) = setup(
            "#records\n1 dan\n",
            "id[pk] name\n#hashes\nid 1\n#endhashes\n",
        );
        let err = store
            .insert_one(&[1.into(), "again".into()], &FieldValues::new())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }));
    }

    #[test]
    fn test_insert_unstorable_value() {
        let (_dir, store) = setup("#records\n", "id[pk] name\n#hashes\n#endhashes\n");
        let err = store
            .insert_one(&[], &FieldValues::new().with("name", "two words"))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.get_all().unwrap().is_empty());
        assert!(store.meta().unwrap().key_set("id").unwrap().is_empty());
    }

    #[test]
    fn test_auto_key_after_i64_max_writes_nothing() {
        let (_dir, store) = setup("#records\n", "id[pk] name\n#hashes\n#endhashes\n");
        store
            .insert_one(&[], &FieldValues::new().with("id", i64::MAX).with("name", "a"))
            .unwrap();
        let records_before = fs::read_to_string(store.path()).unwrap();
        let meta_before = fs::read_to_string(store.meta_path()).unwrap();

        let err = store
            .insert_one(&[], &FieldValues::new().with("name", "b"))
            .unwrap_err();

        assert!(matches!(err, Error::KeyExhausted { ref field, .. } if field == "id"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), records_before);
        assert_eq!(fs::read_to_string(store.meta_path()).unwrap(), meta_before);
        let keys: Vec<u64> = store.meta().unwrap().key_set("id").unwrap().iter().copied().collect();
        assert_eq!(keys, vec![i64::MAX as u64]);
    }

    #[test]
    fn test_delete_one() {
        let (_dir, store) = setup(
            "#records\n1 dan\n2 kek\n3 lol\n",
            "id[pk] name\n#hashes\nid 1 2 3\n#endhashes",
        );

        assert_eq!(store.delete_one(&FieldValues::new().with("id", 1)).unwrap(), 1);
        assert_eq!(store.delete_one(&FieldValues::new().with("id", 2)).unwrap(), 1);
        assert_eq!(store.delete_one(&FieldValues::new().with("id", 2)).unwrap(), 0);

        assert_eq!(fs::read_to_string(store.path()).unwrap(), "#records\n3 lol\n");
        let keys: Vec<u64> = store.meta().unwrap().key_set("id").unwrap().iter().copied().collect();
        assert_eq!(keys, vec![3]);
        assert!(!temp_path(store.path()).exists());
    }

    #[test]
    fn test_delete_then_reinsert_same_key() {
        let (_dir, store) = setup(
            "#records\n1 dan\n2 max\n3 vadim",
            "id[pk] name\n#hashes\nid 1 2 3\n#endhashes",
        );

        assert_eq!(store.delete_one(&FieldValues::new().with("id", 1)).unwrap(), 1);
        assert_eq!(
            store
                .insert_one(&[], &FieldValues::new().with("id", 1).with("name", "Kot"))
                .unwrap(),
            1
        );

        let record = store.get_one(&FieldValues::new().with("id", 1)).unwrap().unwrap();
        assert_eq!(record.text("name").as_deref(), Some("Kot"));
    }

    #[test]
    fn test_delete_no_match_leaves_files() {
        let (_dir, store) = students();
        let before = fs::read_to_string(store.path()).unwrap();
        let meta_before = fs::read_to_string(store.meta_path()).unwrap();

        assert_eq!(store.delete_one(&FieldValues::new().with("name", "nobody")).unwrap(), 0);

        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(fs::read_to_string(store.meta_path()).unwrap(), meta_before);
        assert!(!temp_path(store.path()).exists());
    }
}
