//! Field values and named value lists.
//!
//! Everything is stored as text. `Value` only keeps the integer/text split
//! long enough for primary-key validation on the way in; values read back
//! from disk are always `Value::Text`.

use serde::{Serialize, Serializer};
use std::fmt;
use std::num::TryFromIntError;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Integer value (required for primary-key fields)
    Int(i64),
    /// Text value
    Text(String),
}

impl Value {
    /// Text form used on disk and for condition matching.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Returns the integer if this is `Value::Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Zero and empty text count as "not supplied" for auto-filled fields.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Int(v) => *v == 0,
            Value::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_try_from_int {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for Value {
                type Error = TryFromIntError;

                fn try_from(v: $t) -> std::result::Result<Self, Self::Error> {
                    i64::try_from(v).map(Value::Int)
                }
            }
        )*
    };
}

impl_try_from_int!(u64, usize);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

/// Ordered list of `field = value` pairs.
///
/// Used both for named insert arguments and for fetch/delete conditions.
/// Setting a field twice keeps the last value in the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    entries: Vec<(String, Value)>,
}

impl FieldValues {
    /// Empty list; as a condition it matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets `field` to `value`, replacing an earlier value for the same field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Value for `field`, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Iterates pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no pairs are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (field, value) in iter {
            values.set(field, value);
        }
        values
    }
}
