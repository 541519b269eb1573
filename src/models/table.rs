//! Table identifiers and per-table comparison records.

use crate::error::{DbError, DbResult};
use serde::Serialize;
use std::collections::HashSet;

/// Maximum accepted length of a table identifier, schema included.
pub const MAX_TABLE_NAME_LEN: usize = 128;

/// A validated table identifier: `table` or `schema.table`.
///
/// Each segment must start with an ASCII letter or underscore and contain only
/// ASCII letters, digits, `_` or `$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn parse(name: &str) -> DbResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::invalid_input("Table name cannot be empty"));
        }
        if name.len() > MAX_TABLE_NAME_LEN {
            return Err(DbError::invalid_input(format!(
                "Table name exceeds {} characters: {}",
                MAX_TABLE_NAME_LEN, name
            )));
        }

        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() > 2 {
            return Err(DbError::invalid_input(format!(
                "Table name '{}' has too many parts. Use 'table' or 'schema.table'.",
                name
            )));
        }
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(DbError::invalid_input(format!(
                "Invalid identifier '{}' in table name '{}'",
                bad, name
            )));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TableName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The ordered, duplicate-free set of tables compared in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableList {
    tables: Vec<TableName>,
}

impl TableList {
    pub fn new(tables: Vec<TableName>) -> DbResult<Self> {
        if tables.is_empty() {
            return Err(DbError::invalid_input(
                "At least one table must be configured",
            ));
        }

        let mut seen = HashSet::with_capacity(tables.len());
        for table in &tables {
            if !seen.insert(table.as_str()) {
                return Err(DbError::invalid_input(format!(
                    "Table '{}' is configured more than once",
                    table
                )));
            }
        }

        Ok(Self { tables })
    }

    /// Parse and validate a list of raw table names.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> DbResult<Self> {
        let tables = names
            .iter()
            .map(|n| TableName::parse(n.as_ref()))
            .collect::<DbResult<Vec<_>>>()?;
        Self::new(tables)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, table: &TableName) -> bool {
        self.tables.contains(table)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableName> {
        self.tables.iter()
    }
}

impl<'a> IntoIterator for &'a TableList {
    type Item = &'a TableName;
    type IntoIter = std::slice::Iter<'a, TableName>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Which database a fetch ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Destination,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

/// Row counts for one table on both databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDiff {
    pub name: TableName,
    pub source_row_count: u64,
    pub dest_row_count: u64,
}

impl TableDiff {
    pub fn new(name: TableName, source_row_count: u64, dest_row_count: u64) -> Self {
        Self {
            name,
            source_row_count,
            dest_row_count,
        }
    }

    /// `source_row_count - dest_row_count`, saturating at the `i64` bounds.
    pub fn diff(&self) -> i64 {
        let diff = i128::from(self.source_row_count) - i128::from(self.dest_row_count);
        diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    pub fn is_in_sync(&self) -> bool {
        self.source_row_count == self.dest_row_count
    }
}

impl Serialize for TableDiff {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("TableDiff", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("source_row_count", &self.source_row_count)?;
        state.serialize_field("dest_row_count", &self.dest_row_count)?;
        state.serialize_field("diff", &self.diff())?;
        state.end()
    }
}

/// A table whose comparison failed under the continue-on-error policy.
#[derive(Debug, Clone, Serialize)]
pub struct TableFailure {
    pub table: TableName,
    pub error: String,
}

/// Everything a run produced, in completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonOutcome {
    pub diffs: Vec<TableDiff>,
    pub failures: Vec<TableFailure>,
}

impl ComparisonOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn drifted(&self) -> impl Iterator<Item = &TableDiff> {
        self.diffs.iter().filter(|d| !d.is_in_sync())
    }
}
