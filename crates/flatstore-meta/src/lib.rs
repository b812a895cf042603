//! # FlatStore Metadata
//!
//! Schema metadata for FlatStore sub-stores: the field list, per-field tags
//! and the set of values in use for every primary-key field.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of FlatStore.**
//!
//! Users should depend on the main `flatstore` crate instead.
//!
//! ---
//!
//! The metadata file sits next to the record file (`<name>.sbstore.meta`):
//!
//! ```text
//! id[pk] name
//! #hashes
//! id 1 2 3
//! #endhashes
//! ```
//!
//! Metadata is never cached. Every logical operation loads a fresh
//! [`MetaInfo`] through a [`MetaSource`], and every mutation rewrites the
//! file through [`MetaUpdater`].

use flatstore_core::{FieldTag, Result, Schema};
use std::collections::{BTreeSet, HashMap};

pub mod document;
pub mod reader;
pub mod updater;

pub use document::MetaDocument;
pub use reader::MetaReader;
pub use updater::MetaUpdater;

/// Values currently used by one primary-key field.
pub type KeySet = BTreeSet<u64>;

/// Snapshot of a sub-store's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaInfo {
    /// Field list and tags
    pub schema: Schema,
    /// Key set for every primary-key field (empty if the file has no line for it)
    pub key_sets: HashMap<String, KeySet>,
}

impl MetaInfo {
    /// Snapshot with an empty key set for every primary-key field.
    pub fn new(schema: Schema) -> Self {
        let key_sets = schema
            .primary_keys()
            .map(|field| (field.to_string(), KeySet::new()))
            .collect();
        Self { schema, key_sets }
    }

    /// Replaces the key set of `field`. Builder style, mostly for tests.
    pub fn with_keys(mut self, field: &str, keys: impl IntoIterator<Item = u64>) -> Self {
        self.key_sets
            .insert(field.to_string(), keys.into_iter().collect());
        self
    }

    /// Field names in declared order.
    pub fn fields(&self) -> &[String] {
        self.schema.fields()
    }

    /// True if `field` is tagged as a primary key.
    pub fn is_primary_key(&self, field: &str) -> bool {
        self.schema.has_tag(field, FieldTag::PrimaryKey)
    }

    /// Key set of `field`, if it is a primary key.
    pub fn key_set(&self, field: &str) -> Option<&KeySet> {
        self.key_sets.get(field)
    }
}

/// Anything that can produce a fresh metadata snapshot.
pub trait MetaSource {
    /// Loads the current metadata.
    fn load(&self) -> Result<MetaInfo>;
}

impl MetaSource for MetaInfo {
    fn load(&self) -> Result<MetaInfo> {
        Ok(self.clone())
    }
}
