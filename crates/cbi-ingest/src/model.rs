//! In-memory dataset representation
//!
//! A [`Dataset`] owns an ordered column list and a sequence of [`Record`]s.
//! Records hold positional values only; the column list is shared by the whole
//! dataset, so every record has exactly one value per column in column order.
//!
//! Column names are non-empty and unique ignoring ASCII case, matching how
//! SQLite compares identifiers.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a column's values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    Text,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
        }
    }
}

/// One row of raw string values, positionally bound to the dataset columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub(crate) fn with_value(&self, index: usize, value: String) -> Self {
        let mut values = self.values.clone();
        values[index] = value;
        Self { values }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<Column>,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from column names and rows of values.
    ///
    /// Fails with [`IngestError::InvalidColumns`] for an empty or duplicate
    /// column name and with [`IngestError::RecordWidth`] when any row does
    /// not have one value per column.
    pub fn from_rows<C, R, V>(columns: C, rows: R) -> Result<Self>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = V>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let columns: Vec<Column> = columns.into_iter().map(Column::text).collect();
        check_column_names(columns.iter().map(|c| c.name.as_str()))
            .map_err(|reason| IngestError::InvalidColumns { reason })?;

        let mut dataset = Self::empty(columns);
        for (row, values) in rows.into_iter().enumerate() {
            let values: Vec<String> = values.into_iter().map(Into::into).collect();
            if values.len() != dataset.columns.len() {
                return Err(IngestError::RecordWidth {
                    row,
                    expected: dataset.columns.len(),
                    actual: values.len(),
                });
            }
            dataset.records.push(Record { values });
        }
        Ok(dataset)
    }

    pub(crate) fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Append a record whose width the caller has already checked
    pub(crate) fn push_unchecked(&mut self, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.records.push(Record { values });
    }

    pub(crate) fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            columns: self.columns.clone(),
            records,
        }
    }

    pub(crate) fn with_parts(columns: Vec<Column>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Like [`Dataset::column_index`], but a missing column is an error
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| IngestError::UnknownColumn {
                column: name.to_string(),
            })
    }

    /// Value at `row` in the named column
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.records.get(row)?.get(index)
    }
}

/// Reject blank names and names that collide ignoring ASCII case.
/// The error is a human-readable reason naming the offending column.
pub(crate) fn check_column_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    for (index, name) in names.into_iter().enumerate() {
        if name.trim().is_empty() {
            return Err(format!("column {} has an empty name", index + 1));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(format!("column '{}' appears more than once", name));
        }
    }
    Ok(())
}
