//! Error types for FlatStore.

use std::fmt;

/// The main error type for FlatStore operations.
#[derive(Debug)]
pub enum Error {
    /// A condition or insert argument names a field the schema does not declare
    UnknownField(String),

    /// A primary-key value is not an integer
    TypeMismatch {
        /// Field that was checked
        field: String,
        /// Offending value (text form)
        value: String,
    },

    /// A primary-key value is zero or negative
    NegativePrimaryKey {
        /// Field that was checked
        field: String,
        /// Offending value
        value: i64,
    },

    /// An inserted primary-key value is already in use
    DuplicateKey {
        /// Field that was checked
        field: String,
        /// Value already present in the key set
        value: i64,
    },

    /// A value cannot be stored in the whitespace-delimited record format
    InvalidValue {
        /// Field the value belongs to
        field: String,
        /// Offending value (text form)
        value: String,
    },

    /// The requested sub-store is not registered in the catalog
    SubStoreNotFound(String),

    /// A sub-store name is unusable or already taken
    InvalidName(String),

    /// A field spec carries a tag this version does not know
    UnknownTag(String),

    /// The metadata updater was asked to remove a key that is not in the key set
    KeyNotPresent {
        /// Primary-key field
        field: String,
        /// Missing value
        value: u64,
    },

    /// No key above the current maximum fits a primary-key value
    KeyExhausted {
        /// Primary-key field
        field: String,
        /// Largest key in the key set
        max: u64,
    },

    /// A record, catalog or metadata file violates its structure
    Malformed(String),

    /// Invalid operation or configuration
    InvalidOperation(String),

    /// I/O error
    Io(std::io::Error),
}

impl Error {
    /// Returns true for errors raised by field validation.
    ///
    /// Validation errors are always raised before any file is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownField(_)
                | Error::TypeMismatch { .. }
                | Error::NegativePrimaryKey { .. }
                | Error::DuplicateKey { .. }
                | Error::InvalidValue { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownField(name) => write!(f, "Unknown field: {}", name),
            Error::TypeMismatch { field, value } => write!(
                f,
                "{} is pk field, must be positive integer (got {:?})",
                field, value
            ),
            Error::NegativePrimaryKey { field, value } => write!(
                f,
                "{} is pk field, must be positive integer (got {})",
                field, value
            ),
            Error::DuplicateKey { field, value } => {
                write!(f, "Key {} already exists for field {}", value, field)
            }
            Error::InvalidValue { field, value } => {
                write!(f, "Value {:?} for field {} cannot be stored", value, field)
            }
            Error::SubStoreNotFound(name) => write!(f, "Sub-store not found: {}", name),
            Error::InvalidName(msg) => write!(f, "Invalid sub-store name: {}", msg),
            Error::UnknownTag(tag) => write!(f, "Unknown field tag: {}", tag),
            Error::KeyNotPresent { field, value } => {
                write!(f, "Key {} is not present in key set of {}", value, field)
            }
            Error::KeyExhausted { field, max } => {
                write!(f, "No key left after {} for field {}", max, field)
            }
            Error::Malformed(msg) => write!(f, "Malformed file: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// A specialized `Result` type for FlatStore operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::UnknownField("x".into()).is_validation());
        assert!(Error::DuplicateKey {
            field: "id".into(),
            value: 1
        }
        .is_validation());
        assert!(!Error::Malformed("no sentinel".into()).is_validation());
        assert!(!Error::SubStoreNotFound("x".into()).is_validation());
        assert!(!Error::InvalidOperation("bad filter".into()).is_validation());
    }

    #[test]
    fn test_io_source_is_kept() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("gone"));
    }
}
