//! Loosely-typed records forwarded to the spreadsheet.
//!
//! An entry keeps its fields in insertion order; the first entry of a batch
//! decides the header row of a newly created sheet.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Map<String, Value>);

impl Entry {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert, mostly for tests and the CLI.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Render one field as a sheet cell. Absent fields and nulls are empty.
    pub fn cell(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// True when both entries carry exactly the same keys, in any order.
    pub fn same_fields(&self, other: &Entry) -> bool {
        self.0.len() == other.0.len() && self.0.keys().all(|k| other.0.contains_key(k))
    }

    /// Lay the entry out along a header row.
    pub fn row_for(&self, header: &[String]) -> Vec<String> {
        header.iter().map(|h| self.cell(h)).collect()
    }
}

impl TryFrom<Value> for Entry {
    type Error = AppError;

    fn try_from(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(map) => Ok(Entry(map)),
            _ => Err(AppError::validation("Invalid data format")),
        }
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(map: Map<String, Value>) -> Self {
        Entry(map)
    }
}

/// Check a batch and return the header derived from its first entry.
///
/// Every entry must carry the same key set as the first one.
pub fn batch_header(entries: &[Entry]) -> AppResult<Vec<String>> {
    let first = entries
        .first()
        .ok_or_else(|| AppError::validation("Invalid data format: no entries"))?;

    if first.is_empty() {
        return Err(AppError::validation(
            "Invalid data format: entries must have at least one field",
        ));
    }

    if let Some(pos) = entries.iter().position(|e| !e.same_fields(first)) {
        return Err(AppError::validation(format!(
            "Invalid data format: entry {} does not match the fields of the first entry",
            pos + 1
        )));
    }

    Ok(first.field_names())
}
