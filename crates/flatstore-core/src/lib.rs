//! # FlatStore Core
//!
//! Core types shared by the FlatStore crates: errors, values, records,
//! field specs and the text file format helpers.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of FlatStore.**
//!
//! Users should depend on the main `flatstore` crate instead, which provides
//! the stable public API. This crate's API may change without notice between
//! minor versions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod format;
pub mod record;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
pub use format::SyncMode;
pub use record::{build_record, Record, Slot, EMPTY_TOKEN};
pub use schema::{parse_spec_list, parse_spec_str, FieldTag, Schema, SpecInfo};
pub use value::{FieldValues, Value};
