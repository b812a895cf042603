//! Field validation against a metadata snapshot.
//!
//! A validator is built from the snapshot loaded for the current operation
//! and dropped with it; key sets are never carried across operations.

use flatstore_core::{Error, FieldTag, FieldValues, Result, Value};
use flatstore_meta::MetaInfo;

/// Checks field names and per-field tag rules.
pub struct FieldValidator<'a> {
    meta: &'a MetaInfo,
}

impl<'a> FieldValidator<'a> {
    /// Validator over one metadata snapshot.
    pub fn new(meta: &'a MetaInfo) -> Self {
        Self { meta }
    }

    /// Checks every condition.
    ///
    /// Each name must be a declared field. With `inserting` set, primary-key
    /// values must also be unused.
    pub fn check(&self, conditions: &FieldValues, inserting: bool) -> Result<()> {
        for (field, value) in conditions.iter() {
            if !self.meta.schema.contains(field) {
                return Err(Error::UnknownField(field.to_string()));
            }
            self.validate(field, value, inserting)?;
        }
        Ok(())
    }

    /// Applies the rules of every tag on `field` to `value`.
    ///
    /// Untagged fields accept anything.
    pub fn validate(&self, field: &str, value: &Value, inserting: bool) -> Result<()> {
        for tag in self.meta.schema.tags(field) {
            match tag {
                FieldTag::PrimaryKey => self.check_primary_key(field, value, inserting)?,
            }
        }
        Ok(())
    }

    fn check_primary_key(&self, field: &str, value: &Value, inserting: bool) -> Result<()> {
        let key = value.as_int().ok_or_else(|| Error::TypeMismatch {
            field: field.to_string(),
            value: value.to_text(),
        })?;
        if key <= 0 {
            return Err(Error::NegativePrimaryKey {
                field: field.to_string(),
                value: key,
            });
        }
        if inserting {
            // key > 0 here, so the cast is lossless
            let used = self
                .meta
                .key_set(field)
                .map(|keys| keys.contains(&(key as u64)))
                .unwrap_or(false);
            if used {
                return Err(Error::DuplicateKey {
                    field: field.to_string(),
                    value: key,
                });
            }
        }
        Ok(())
    }
}
