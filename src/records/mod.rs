//! Scored line items and the edits an editor can make to them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scoring::CategoryConfig;

/// One scored row of a category table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Free-text columns keyed by field key, in schema order
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    #[serde(default)]
    pub co_authors: u32,
    /// Author role attribute; blank means unset
    #[serde(default)]
    pub role: String,
    /// Derived from `role`, never edited directly
    #[serde(default)]
    pub score: u32,
}

impl LineItem {
    /// A fresh row with every schema field empty and no role.
    pub fn blank(schema: &CategoryConfig) -> Self {
        Self {
            fields: schema
                .fields
                .iter()
                .map(|f| (f.key.clone(), String::new()))
                .collect(),
            co_authors: 0,
            role: String::new(),
            score: 0,
        }
    }

    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }
}

/// A single field change on a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Text { key: String, value: String },
    CoAuthors(u32),
    Role(String),
}

impl FieldEdit {
    pub const CO_AUTHORS_KEY: &'static str = "co_authors";
    pub const ROLE_KEY: &'static str = "role";

    /// Build an edit from a field name and raw input, as typed on the command line.
    pub fn parse(field: &str, value: &str) -> Result<Self, String> {
        match field {
            Self::CO_AUTHORS_KEY => value
                .trim()
                .parse()
                .map(FieldEdit::CoAuthors)
                .map_err(|_| format!("co_authors must be a non-negative integer, got '{}'", value)),
            Self::ROLE_KEY => Ok(FieldEdit::Role(value.to_string())),
            key => Ok(FieldEdit::Text {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Parse a `field=value` pair.
    pub fn parse_assignment(s: &str) -> Result<Self, String> {
        let (field, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected field=value, got '{}'", s))?;
        Self::parse(field.trim(), value)
    }
}

/// A row paired with its display number (1-based, derived from position).
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub number: usize,
    pub item: &'a LineItem,
}

/// Iterate rows with their position-derived numbers.
pub fn numbered(items: &[LineItem]) -> impl Iterator<Item = Row<'_>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| Row { number: i + 1, item })
}
