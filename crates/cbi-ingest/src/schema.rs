//! Table schema planning and SQL generation
//!
//! Every column is stored as `TEXT`, whatever kind the dataset assigns it.
//! Identifiers are always quoted; record values only ever reach SQLite as
//! bound parameters, never as SQL text.

use crate::error::{IngestError, Result};
use crate::model::Dataset;

/// Columns and table name used to create and fill one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub table: String,
    pub columns: Vec<String>,
}

impl TablePlan {
    /// Derive the plan from a dataset's columns.
    ///
    /// A dataset with no records has no reliable schema to key off and fails
    /// with [`IngestError::EmptySchema`].
    pub fn from_dataset(dataset: &Dataset, table: &str) -> Result<Self> {
        if dataset.is_empty() {
            return Err(IngestError::EmptySchema {
                table: table.to_string(),
            });
        }

        Ok(Self {
            table: table.to_string(),
            columns: dataset.column_names().map(str::to_string).collect(),
        })
    }

    /// Idempotent DDL: `CREATE TABLE IF NOT EXISTS "t" ("a" TEXT, ...)`
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} TEXT", quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(&self.table),
            columns
        )
    }

    /// Insert statement with one positional placeholder per column
    pub fn insert_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&self.table),
            columns,
            placeholders
        )
    }
}

/// Quote an SQL identifier, doubling any embedded double quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
