//! Change record store and query types.
//!
//! [`ChangeHistory`] is the per-instance ledger. The flat record sequence is
//! the single source of truth; the by-field index only holds positions into
//! it, so the grouped view is always a stable partition of the flat one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SelvError};
use crate::snapshot::Value;

/// One ledger entry: a field's value transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// Position in the instance's ledger (0-based, insertion order)
    pub seq: u64,
    /// When the write happened
    pub timestamp: DateTime<Utc>,
    /// Field the write targeted
    pub field: String,
    /// Snapshot before the write; `None` for the field's first record
    pub from: Option<Value>,
    /// Snapshot after the write
    pub to: Value,
}

impl ChangeRecord {
    /// True for the record of a field's initialization
    pub fn is_initial(&self) -> bool {
        self.from.is_none()
    }

    /// Same record without the field name, for grouped views
    pub fn to_field_change(&self) -> FieldChange {
        FieldChange {
            seq: self.seq,
            timestamp: self.timestamp,
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

/// A record inside a grouped view; the field is the group key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub from: Option<Value>,
    pub to: Value,
}

/// Shape of a history query result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFormat {
    /// One time-ordered sequence across all fields
    #[default]
    Flat,
    /// Field name → that field's records, fields in first-seen order
    Grouped,
}

impl FromStr for HistoryFormat {
    type Err = SelvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flat" => Ok(HistoryFormat::Flat),
            // "attr" is the older name for the grouped view
            "grouped" | "attr" => Ok(HistoryFormat::Grouped),
            other => Err(SelvError::configuration(format!(
                "format must be 'flat' or 'grouped', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for HistoryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryFormat::Flat => f.write_str("flat"),
            HistoryFormat::Grouped => f.write_str("grouped"),
        }
    }
}

/// Selectors for a history query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub field: Option<String>,
    pub format: HistoryFormat,
}

impl HistoryQuery {
    /// Query for the full flat history
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one field
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Choose the result shape
    pub fn format(mut self, format: HistoryFormat) -> Self {
        self.format = format;
        self
    }

    /// Reject contradictory selector combinations
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when a field filter is combined with
    /// the grouped format.
    pub fn validate(&self) -> Result<()> {
        if let (Some(field), HistoryFormat::Grouped) = (&self.field, self.format) {
            return Err(SelvError::configuration(format!(
                "cannot combine field filter '{field}' with grouped format"
            )));
        }
        Ok(())
    }
}

/// Result of a history query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum History {
    Flat(Vec<ChangeRecord>),
    Grouped(IndexMap<String, Vec<FieldChange>>),
}

impl History {
    /// Total number of records in the result
    pub fn len(&self) -> usize {
        match self {
            History::Flat(records) => records.len(),
            History::Grouped(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_flat(&self) -> Option<&[ChangeRecord]> {
        match self {
            History::Flat(records) => Some(records),
            History::Grouped(_) => None,
        }
    }

    pub fn as_grouped(&self) -> Option<&IndexMap<String, Vec<FieldChange>>> {
        match self {
            History::Grouped(groups) => Some(groups),
            History::Flat(_) => None,
        }
    }

    pub fn into_flat(self) -> Option<Vec<ChangeRecord>> {
        match self {
            History::Flat(records) => Some(records),
            History::Grouped(_) => None,
        }
    }

    pub fn into_grouped(self) -> Option<IndexMap<String, Vec<FieldChange>>> {
        match self {
            History::Grouped(groups) => Some(groups),
            History::Flat(_) => None,
        }
    }
}

/// Append-only, time-ordered ledger of change records for one instance
#[derive(Debug, Clone, Default)]
pub struct ChangeHistory {
    records: Vec<ChangeRecord>,
    by_field: IndexMap<String, Vec<usize>>,
}

impl ChangeHistory {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, timestamped now
    pub fn record(&mut self, field: &str, from: Option<Value>, to: Value) -> &ChangeRecord {
        let position = self.records.len();
        self.records.push(ChangeRecord {
            seq: position as u64,
            timestamp: Utc::now(),
            field: field.to_string(),
            from,
            to,
        });
        self.by_field
            .entry(field.to_string())
            .or_default()
            .push(position);
        &self.records[position]
    }

    /// All records in insertion order
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Records of one field in insertion order
    pub fn for_field<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a ChangeRecord> + 'a {
        self.by_field
            .get(field)
            .into_iter()
            .flatten()
            .map(move |&position| &self.records[position])
    }

    /// Most recent record of a field
    pub fn latest(&self, field: &str) -> Option<&ChangeRecord> {
        self.by_field
            .get(field)
            .and_then(|positions| positions.last())
            .map(|&position| &self.records[position])
    }

    /// Fields with at least one record, in first-seen order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.by_field.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Run a query against the ledger
    ///
    /// An unknown field yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the query combines a field filter
    /// with the grouped format.
    pub fn query(&self, query: &HistoryQuery) -> Result<History> {
        query.validate()?;

        match (query.format, &query.field) {
            (HistoryFormat::Flat, None) => Ok(History::Flat(self.records.clone())),
            (HistoryFormat::Flat, Some(field)) => {
                Ok(History::Flat(self.for_field(field).cloned().collect()))
            }
            (HistoryFormat::Grouped, _) => Ok(History::Grouped(self.grouped())),
        }
    }

    /// Grouped view of the whole ledger
    pub fn grouped(&self) -> IndexMap<String, Vec<FieldChange>> {
        self.by_field
            .iter()
            .map(|(field, positions)| {
                let changes = positions
                    .iter()
                    .map(|&position| self.records[position].to_field_change())
                    .collect();
                (field.clone(), changes)
            })
            .collect()
    }
}
