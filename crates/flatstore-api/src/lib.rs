//! # FlatStore
//!
//! A minimal flat-file record store. A store is a catalog file listing named
//! sub-stores; each sub-store keeps fixed-schema records as whitespace
//! separated text lines plus a metadata file with the schema and the set of
//! values used by every primary-key field.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flatstore::{FieldValues, Store};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open("./data/school.estore")?;
//!     let students = store.create_sub_store("students", &["id[pk]", "name"])?;
//!
//!     // `id` is a primary key and gets auto-filled
//!     students.insert_one(&[], &FieldValues::new().with("name", "kek"))?;
//!
//!     let student = students.get_one(&FieldValues::new().with("id", 1))?;
//!     assert_eq!(student.unwrap().text("name").as_deref(), Some("kek"));
//!
//!     students.delete_one(&FieldValues::new().with("id", 1))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Nothing is locked. Files are replaced atomically, but concurrent writers
//! on one sub-store can leave its key sets inconsistent with its records.
//! Callers must allow at most one writer per sub-store at a time.

use flatstore_core::format::{
    next_line, open_for_append, seek_to_sentinel, sync_file, trim_line_end, write_atomic,
    write_line, SUB_STORES_START,
};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod logging;

// Re-export core types
pub use flatstore_core::{
    build_record, parse_spec_list, parse_spec_str, Error, FieldTag, FieldValues, Record, Result,
    Schema, Slot, SpecInfo, SyncMode, Value,
};

// Metadata components
pub use flatstore_meta::{KeySet, MetaInfo, MetaReader, MetaSource, MetaUpdater};

// Storage components
pub use flatstore_storage::{
    AutoFiller, FieldValidator, RecordIter, SubStore, SubStoreConfig, SubStoreCreator,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default first line of a new catalog file
pub const DEFAULT_BANNER: &str = "FlatStore - Basic file storage";

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Durability of catalog, record and metadata writes
    pub sync_mode: SyncMode,
    /// Banner written as line 1 of a new catalog file
    pub banner: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::Sync,
            banner: DEFAULT_BANNER.to_string(),
        }
    }
}

/// A catalog of sub-stores.
///
/// Sub-store files live next to the catalog file, as `<name>.sbstore` and
/// `<name>.sbstore.meta`.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    config: StoreConfig,
    creator: SubStoreCreator,
}

impl Store {
    /// Opens the catalog at `path`, creating it if it does not exist.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use flatstore::Store;
    ///
    /// let store = Store::open("./data/app.estore")?;
    /// println!("{:?}", store.list()?);
    /// # Ok::<(), flatstore::Error>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Opens the catalog with custom configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        if !path.exists() {
            let banner = trim_line_end(&config.banner).to_string();
            write_atomic(
                &path,
                &format!("{}\n{}\n", banner, SUB_STORES_START),
                config.sync_mode,
            )?;
            info!(path = %path.display(), "Created store catalog");
        }

        Ok(Self {
            creator: SubStoreCreator::new(dir, config.sync_mode),
            path,
            config,
        })
    }

    /// Catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered sub-store names, in catalog order.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        seek_to_sentinel(&mut reader, SUB_STORES_START)?;

        let mut names = Vec::new();
        while let Some(line) = next_line(&mut reader)? {
            let name = line.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|n| n == name))
    }

    /// Creates a sub-store from spec tokens and registers it.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use flatstore::Store;
    ///
    /// let store = Store::open("./data/app.estore")?;
    /// let labs = store.create_sub_store("labs", &["id[pk]", "subject", "mark"])?;
    /// assert_eq!(labs.spec()?, vec!["id", "subject", "mark"]);
    /// # Ok::<(), flatstore::Error>(())
    /// ```
    pub fn create_sub_store<S: AsRef<str>>(&self, name: &str, spec: &[S]) -> Result<SubStore> {
        flatstore_storage::validate_name(name)?;
        if self.contains(name)? {
            return Err(Error::InvalidName(format!("{} is already registered", name)));
        }

        let record_path = self.creator.create(name, spec)?;
        self.register(name)?;
        info!(name, catalog = %self.path.display(), "Registered sub-store");

        self.open_sub_store(record_path)
    }

    /// Creates a sub-store from a spec string such as `"id[pk] name"`.
    pub fn create_sub_store_from_str(&self, name: &str, spec: &str) -> Result<SubStore> {
        self.create_sub_store(name, &[spec])
    }

    /// Opens a registered sub-store.
    ///
    /// Fails with [`Error::SubStoreNotFound`] if `name` is not in the catalog.
    pub fn get_sub_store(&self, name: &str) -> Result<SubStore> {
        if !self.contains(name)? {
            return Err(Error::SubStoreNotFound(name.to_string()));
        }
        self.open_sub_store(self.creator.record_path(name))
    }

    fn open_sub_store(&self, record_path: PathBuf) -> Result<SubStore> {
        SubStore::open_with_config(
            record_path,
            SubStoreConfig {
                sync_mode: self.config.sync_mode,
            },
        )
    }

    fn register(&self, name: &str) -> Result<()> {
        let mut file = open_for_append(&self.path)?;
        write_line(&mut file, name)?;
        sync_file(&file, self.config.sync_mode)
    }
}
