//! Auto-fill of primary-key fields on insert.

use flatstore_core::{Error, FieldTag, Record, Result, Value};
use flatstore_meta::MetaSource;

/// Fills missing primary-key values with `max(key set) + 1`.
pub struct AutoFiller<'a, M: MetaSource + ?Sized> {
    source: &'a M,
}

impl<'a, M: MetaSource + ?Sized> AutoFiller<'a, M> {
    /// Filler reading key sets from `source`.
    pub fn new(source: &'a M) -> Self {
        Self { source }
    }

    /// Assigns the next key to every primary-key field that is empty or falsy.
    ///
    /// Zero and empty text count as missing and are overwritten. Gaps in the
    /// key set are not reused. Fails with [`Error::KeyExhausted`] when the
    /// next key would not fit in an `i64`.
    pub fn fill(&self, mut record: Record) -> Result<Record> {
        let meta = self.source.load()?;
        for field in meta.fields() {
            if !meta.schema.has_tag(field, FieldTag::PrimaryKey) || record.is_populated(field) {
                continue;
            }
            let next = match meta.key_set(field).and_then(|keys| keys.iter().next_back()) {
                Some(&max) => max
                    .checked_add(1)
                    .and_then(|next| i64::try_from(next).ok())
                    .ok_or_else(|| Error::KeyExhausted {
                        field: field.to_string(),
                        max,
                    })?,
                None => 1,
            };
            record.set(field, Value::Int(next));
        }
        Ok(record)
    }
}
