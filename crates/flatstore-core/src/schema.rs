//! Field specs and schemas.
//!
//! A field spec token is `name` or `name[tag1,tag2]`. The same syntax is used
//! by callers creating a sub-store and by the first line of a metadata file.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-field configuration tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    /// Unique, positive integer; tracked in the metadata key sets
    PrimaryKey,
}

impl FieldTag {
    /// Token used inside brackets.
    pub fn token(&self) -> &'static str {
        match self {
            FieldTag::PrimaryKey => "pk",
        }
    }

    /// Parses a bracket token.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "pk" => Ok(FieldTag::PrimaryKey),
            other => Err(Error::UnknownTag(other.to_string())),
        }
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Splits one spec token into its field name and raw tag list.
pub fn split_field_token(token: &str) -> Result<(String, Vec<String>)> {
    let Some(open) = token.find('[') else {
        return Ok((token.to_string(), Vec::new()));
    };
    let name = &token[..open];
    let inner = token[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| Error::Malformed(format!("unterminated tag list in {:?}", token)))?;
    if name.is_empty() {
        return Err(Error::Malformed(format!("field spec without a name: {:?}", token)));
    }
    let tags = inner
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    Ok((name.to_string(), tags))
}

/// Raw result of parsing a field spec: names plus their untyped tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecInfo {
    /// Field names in declared order
    pub fields: Vec<String>,
    /// Raw tag tokens for every field
    pub configs: HashMap<String, Vec<String>>,
}

impl SpecInfo {
    /// Converts raw tags into a typed schema.
    pub fn to_schema(&self) -> Result<Schema> {
        let mut tags = HashMap::with_capacity(self.fields.len());
        for field in &self.fields {
            if tags.contains_key(field) {
                return Err(Error::Malformed(format!("field {} declared twice", field)));
            }
            let parsed = self
                .configs
                .get(field)
                .map(|raw| raw.iter().map(|t| FieldTag::parse(t)).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            tags.insert(field.clone(), parsed);
        }
        Ok(Schema {
            fields: Arc::from(self.fields.clone()),
            tags,
        })
    }
}

/// Parses a list of spec tokens (`["id[pk]", "name"]`).
///
/// Elements may themselves hold several space-separated tokens.
pub fn parse_spec_list<S: AsRef<str>>(spec: &[S]) -> Result<SpecInfo> {
    let mut info = SpecInfo::default();
    for token in spec.iter().flat_map(|s| s.as_ref().split_whitespace()) {
        let (name, tags) = split_field_token(token)?;
        info.fields.push(name.clone());
        info.configs.insert(name, tags);
    }
    Ok(info)
}

/// Parses a spec string (`"id[pk] name"`).
pub fn parse_spec_str(spec: &str) -> Result<SpecInfo> {
    parse_spec_list(&[spec])
}

/// Ordered field list plus typed per-field tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Arc<[String]>,
    tags: HashMap<String, Vec<FieldTag>>,
}

impl Schema {
    /// Parses the header line of a metadata file.
    pub fn parse_header(line: &str) -> Result<Self> {
        let schema = parse_spec_str(line)?.to_schema()?;
        if schema.fields.is_empty() {
            return Err(Error::Malformed("metadata header declares no fields".to_string()));
        }
        Ok(schema)
    }

    /// Field names in declared order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Shared handle to the field list, for building records.
    pub fn field_list(&self) -> Arc<[String]> {
        Arc::clone(&self.fields)
    }

    /// True if `field` is declared.
    pub fn contains(&self, field: &str) -> bool {
        self.tags.contains_key(field)
    }

    /// Tags of `field`; empty for undeclared or untagged fields.
    pub fn tags(&self, field: &str) -> &[FieldTag] {
        self.tags.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if `field` carries `tag`.
    pub fn has_tag(&self, field: &str, tag: FieldTag) -> bool {
        self.tags(field).contains(&tag)
    }

    /// Primary-key fields in declared order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|f| self.has_tag(f, FieldTag::PrimaryKey))
    }

    /// Renders the schema as a metadata header line.
    pub fn header_line(&self) -> String {
        self.fields
            .iter()
            .map(|field| {
                let tags = self.tags(field);
                if tags.is_empty() {
                    field.clone()
                } else {
                    let joined: Vec<&str> = tags.iter().map(FieldTag::token).collect();
                    format!("{}[{}]", field, joined.join(","))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
