//! Parsed form of a metadata file that can be written back.
//!
//! Everything outside the key-set lines is kept verbatim so a rewrite only
//! touches the section it owns.

use crate::{KeySet, MetaInfo};
use flatstore_core::format::{
    next_line, read_until_sentinel, trim_line_end, KEY_SETS_END, KEY_SETS_START,
};
use flatstore_core::{Error, FieldTag, Result, Schema};
use std::io::BufRead;

/// A metadata file split into its regions.
#[derive(Debug, Clone)]
pub struct MetaDocument {
    /// Lines before `#hashes` (header first), terminators included
    prefix: Vec<String>,
    /// Key-set lines in file order
    key_lines: Vec<(String, KeySet)>,
    /// Lines after `#endhashes`, terminators included
    suffix: Vec<String>,
    schema: Schema,
}

impl MetaDocument {
    /// Fresh document for a new sub-store: one empty key-set line per
    /// primary-key field.
    pub fn fresh(schema: Schema) -> Self {
        let key_lines = schema
            .primary_keys()
            .map(|field| (field.to_string(), KeySet::new()))
            .collect();
        Self {
            prefix: vec![format!("{}\n", schema.header_line())],
            key_lines,
            suffix: Vec::new(),
            schema,
        }
    }

    /// Parses a whole metadata file.
    pub fn parse<R: BufRead>(mut reader: R) -> Result<Self> {
        let prefix = read_until_sentinel(&mut reader, KEY_SETS_START)?;
        let header = prefix
            .first()
            .ok_or_else(|| Error::Malformed("metadata file has no header line".to_string()))?;
        let schema = Schema::parse_header(trim_line_end(header))?;

        let mut key_lines: Vec<(String, KeySet)> = Vec::new();
        for line in read_until_sentinel(&mut reader, KEY_SETS_END)? {
            let mut tokens = line.split_whitespace();
            let Some(field) = tokens.next() else {
                continue;
            };
            if !schema.has_tag(field, FieldTag::PrimaryKey) {
                return Err(Error::Malformed(format!(
                    "key set for non primary-key field {}",
                    field
                )));
            }
            if key_lines.iter().any(|(name, _)| name == field) {
                return Err(Error::Malformed(format!("key set for {} listed twice", field)));
            }
            let keys = tokens
                .map(|token| {
                    token.parse::<u64>().map_err(|_| {
                        Error::Malformed(format!("bad key {:?} in key set of {}", token, field))
                    })
                })
                .collect::<Result<KeySet>>()?;
            key_lines.push((field.to_string(), keys));
        }

        let mut suffix = Vec::new();
        while let Some(line) = next_line(&mut reader)? {
            suffix.push(line);
        }

        Ok(Self {
            prefix,
            key_lines,
            suffix,
            schema,
        })
    }

    /// Schema declared by the header.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Snapshot of schema and key sets.
    pub fn info(&self) -> MetaInfo {
        let mut info = MetaInfo::new(self.schema.clone());
        for (field, keys) in &self.key_lines {
            info.key_sets.insert(field.clone(), keys.clone());
        }
        info
    }

    /// Mutable key set of a primary-key field, creating its line if needed.
    pub fn key_set_mut(&mut self, field: &str) -> Option<&mut KeySet> {
        if !self.schema.has_tag(field, FieldTag::PrimaryKey) {
            return None;
        }
        let idx = match self.key_lines.iter().position(|(name, _)| name == field) {
            Some(idx) => idx,
            None => {
                self.key_lines.push((field.to_string(), KeySet::new()));
                self.key_lines.len() - 1
            }
        };
        Some(&mut self.key_lines[idx].1)
    }

    /// Renders the document back to file contents.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.prefix {
            push_line(&mut out, line);
        }
        push_line(&mut out, KEY_SETS_START);
        for (field, keys) in &self.key_lines {
            let mut line = field.clone();
            for key in keys {
                line.push(' ');
                line.push_str(&key.to_string());
            }
            push_line(&mut out, &line);
        }
        push_line(&mut out, KEY_SETS_END);
        for line in &self.suffix {
            push_line(&mut out, line);
        }
        out
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(trim_line_end(line));
    out.push('\n');
}
