//! Schema-bound records.
//!
//! A `Record` holds one slot per schema field, in schema order. Slots may be
//! empty (field declared but no value), which is distinct from asking for a
//! field the schema does not declare at all.

use crate::value::{FieldValues, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Token written for an empty slot.
///
/// Older stores wrote missing values this way, so it is kept for
/// compatibility with existing record files.
pub const EMPTY_TOKEN: &str = "None";

/// Result of looking up a field on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// The schema does not declare this field
    Undeclared,
    /// Declared, but no value
    Empty,
    /// Declared and populated
    Filled(&'a Value),
}

/// An ordered, schema-bound mapping from field name to value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Arc<[String]>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Record with every slot empty.
    pub fn empty(fields: Arc<[String]>) -> Self {
        let values = vec![None; fields.len()];
        Self { fields, values }
    }

    /// Binds positional values to schema order, then applies named values.
    ///
    /// Named values win over positional ones for the same field. Positional
    /// values past the end of the schema and named values for undeclared
    /// fields are ignored; rejecting those is the validator's job.
    pub fn build(fields: Arc<[String]>, positional: &[Value], named: &FieldValues) -> Self {
        let mut record = Self::empty(fields);
        for (slot, value) in record.values.iter_mut().zip(positional) {
            *slot = Some(value.clone());
        }
        for (field, value) in named.iter() {
            record.set(field, value.clone());
        }
        record
    }

    /// Record from raw tokens of one stored line.
    pub fn from_tokens<'t>(fields: Arc<[String]>, tokens: impl IntoIterator<Item = &'t str>) -> Self {
        let mut record = Self::empty(fields);
        for (slot, token) in record.values.iter_mut().zip(tokens) {
            *slot = Some(Value::Text(token.to_string()));
        }
        record
    }

    /// Schema field names, in order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|name| name == field)
    }

    /// Looks up `field`, distinguishing undeclared from empty.
    pub fn slot(&self, field: &str) -> Slot<'_> {
        match self.position(field) {
            None => Slot::Undeclared,
            Some(idx) => match &self.values[idx] {
                Some(value) => Slot::Filled(value),
                None => Slot::Empty,
            },
        }
    }

    /// Value of `field`; `None` for empty or undeclared fields.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self.slot(field) {
            Slot::Filled(value) => Some(value),
            _ => None,
        }
    }

    /// Text form of `field`, if populated.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(Value::to_text)
    }

    /// Sets a declared field. Returns false if the schema lacks `field`.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> bool {
        match self.position(field) {
            Some(idx) => {
                self.values[idx] = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// True when `field` has a value that is not falsy.
    pub fn is_populated(&self, field: &str) -> bool {
        self.get(field).map(|v| !v.is_falsy()).unwrap_or(false)
    }

    /// Iterates `(field, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_ref))
    }

    /// Text forms of all populated fields.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter()
            .filter_map(|(field, value)| value.map(|v| (field.to_string(), v.to_text())))
            .collect()
    }

    /// Tokens for one record line, empty slots written as [`EMPTY_TOKEN`].
    pub fn tokens(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|value| match value {
                Some(v) => v.to_text(),
                None => EMPTY_TOKEN.to_string(),
            })
            .collect()
    }

    /// True if every condition equals the stored text form of its field.
    pub fn matches(&self, conditions: &FieldValues) -> bool {
        conditions.iter().all(|(field, expected)| {
            self.get(field)
                .map(|value| value.to_text() == expected.to_text())
                .unwrap_or(false)
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record<")?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Some(v) => write!(f, "{}={}", field, v)?,
                None => write!(f, "{}=<empty>", field)?,
            }
        }
        write!(f, ">")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let populated = self.values.iter().filter(|v| v.is_some()).count();
        let mut map = serializer.serialize_map(Some(populated))?;
        for (field, value) in self.iter() {
            if let Some(value) = value {
                map.serialize_entry(field, value)?;
            }
        }
        map.end()
    }
}

/// Builds a record for `fields` from positional and named arguments.
///
/// Entry point used by the engine before validation and auto-fill.
pub fn build_record(fields: &[String], positional: &[Value], named: &FieldValues) -> Record {
    Record::build(Arc::from(fields), positional, named)
}
