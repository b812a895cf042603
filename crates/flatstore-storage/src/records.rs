//! Record file reading and line encoding.
//!
//! Record files start with a `#records` sentinel followed by one record per
//! line, values space-separated in schema order.

use flatstore_core::format::{next_line, seek_to_sentinel, RECORDS_START};
use flatstore_core::{Error, FieldValues, Record, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Parses one data line. Blank lines yield `None`.
pub fn parse_line(fields: &Arc<[String]>, line: &str) -> Result<Option<Record>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    if tokens.len() != fields.len() {
        return Err(Error::Malformed(format!(
            "record line has {} values, schema has {} fields: {:?}",
            tokens.len(),
            fields.len(),
            line.trim_end()
        )));
    }
    Ok(Some(Record::from_tokens(Arc::clone(fields), tokens)))
}

/// Encodes a record as one data line (no terminator).
///
/// Fails with [`Error::InvalidValue`] for values that would not survive the
/// whitespace split on the way back in.
pub fn encode_line(record: &Record) -> Result<String> {
    for (field, value) in record.iter() {
        if let Some(value) = value {
            let text = value.to_text();
            if text.is_empty() || text.chars().any(char::is_whitespace) {
                return Err(Error::InvalidValue {
                    field: field.to_string(),
                    value: text,
                });
            }
        }
    }
    Ok(record.tokens().join(" "))
}

/// Lazy, single-pass scan over a record file.
///
/// Yields matching records in file order. The file handle is released as
/// soon as the scan reaches the end, hits an error, or is dropped.
pub struct RecordIter {
    reader: Option<BufReader<File>>,
    fields: Arc<[String]>,
    conditions: FieldValues,
}

impl RecordIter {
    /// Opens `path` and positions the scan after the `#records` sentinel.
    pub fn open(path: &Path, fields: Arc<[String]>, conditions: FieldValues) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        seek_to_sentinel(&mut reader, RECORDS_START)?;
        Ok(Self {
            reader: Some(reader),
            fields,
            conditions,
        })
    }

    /// True while the underlying file is still open.
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        while let Some(line) = next_line(reader)? {
            if let Some(record) = parse_line(&self.fields, &line)? {
                if record.matches(&self.conditions) {
                    return Ok(Some(record));
                }
            }
        }
        Ok(None)
    }
}

impl Iterator for RecordIter {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.reader = None;
                None
            }
            Err(e) => {
                self.reader = None;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for RecordIter {}
