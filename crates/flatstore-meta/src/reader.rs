//! Loads metadata snapshots from disk.

use crate::{MetaDocument, MetaInfo, MetaSource};
use flatstore_core::format::meta_path;
use flatstore_core::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Reads the metadata file of one sub-store.
#[derive(Debug, Clone)]
pub struct MetaReader {
    path: PathBuf,
}

impl MetaReader {
    /// Reader for the metadata file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reader for the metadata file belonging to `record_path`.
    pub fn for_record_file(record_path: &Path) -> Self {
        Self::new(meta_path(record_path))
    }

    /// Metadata file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the whole file, keeping the regions needed for a rewrite.
    pub fn load_document(&self) -> Result<MetaDocument> {
        let file = File::open(&self.path)?;
        MetaDocument::parse(BufReader::new(file))
    }
}

impl MetaSource for MetaReader {
    fn load(&self) -> Result<MetaInfo> {
        Ok(self.load_document()?.info())
    }
}
