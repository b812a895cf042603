//! Creates the files of a new sub-store.

use flatstore_core::format::{meta_path, write_atomic, RECORDS_START, RECORD_FILE_EXT};
use flatstore_core::{parse_spec_list, Error, Result, SyncMode};
use flatstore_meta::MetaDocument;
use std::path::{Path, PathBuf};
use tracing::info;

/// Checks that `name` can be used as a sub-store and catalog entry.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName("name cannot be empty".to_string()));
    }
    if name.starts_with('#') {
        return Err(Error::InvalidName(format!("{:?} starts with '#'", name)));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '\\')
    {
        return Err(Error::InvalidName(format!(
            "{:?} contains whitespace or a path separator",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidName(format!("{:?} is reserved", name)));
    }
    Ok(())
}

/// Writes empty record and metadata files into one directory.
#[derive(Debug, Clone)]
pub struct SubStoreCreator {
    dir: PathBuf,
    sync_mode: SyncMode,
}

impl SubStoreCreator {
    /// Creator writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>, sync_mode: SyncMode) -> Self {
        Self {
            dir: dir.into(),
            sync_mode,
        }
    }

    /// Record file path for `name`.
    pub fn record_path(&self, name: &str) -> PathBuf {
        record_path_in(&self.dir, name)
    }

    /// Creates `<name>.sbstore` and `<name>.sbstore.meta` from spec tokens.
    ///
    /// The field spec is fully parsed (unknown tags rejected) before anything is
    /// written. Existing files are never overwritten.
    pub fn create<S: AsRef<str>>(&self, name: &str, spec: &[S]) -> Result<PathBuf> {
        validate_name(name)?;
        let schema = parse_spec_list(spec)?.to_schema()?;
        if schema.fields().is_empty() {
            return Err(Error::Malformed(format!("spec for {} declares no fields", name)));
        }

        let record_path = self.record_path(name);
        let meta = meta_path(&record_path);
        if record_path.exists() || meta.exists() {
            return Err(Error::InvalidName(format!("sub-store {} already exists", name)));
        }

        write_atomic(&meta, &MetaDocument::fresh(schema.clone()).render(), self.sync_mode)?;
        write_atomic(&record_path, &format!("{}\n", RECORDS_START), self.sync_mode)?;

        info!(name, spec = %schema.header_line(), "Created sub-store");
        Ok(record_path)
    }
}

/// `<dir>/<name>.sbstore`
pub fn record_path_in(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, RECORD_FILE_EXT))
}
