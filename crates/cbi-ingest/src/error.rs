//! Error types for the ingestion pipeline
//!
//! Every stage reports failures through [`IngestError`]. Each variant carries
//! enough context (file path, column, row index, table name) to diagnose the
//! failure without re-running the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The source file extension is not one the parser reads
    #[error("Unsupported file format '{extension}' for {path}. Provide a .csv or .txt file.")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The source file has no header line
    #[error("No header line found in {path}")]
    EmptyDataset { path: PathBuf },

    /// The header line names an empty or duplicated column
    #[error("Invalid header in {path}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Column names passed to a dataset constructor are empty or duplicated
    #[error("Invalid dataset columns: {reason}")]
    InvalidColumns { reason: String },

    /// A record does not have one value per dataset column
    #[error("Record {row} has {actual} values, expected {expected}")]
    RecordWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A configured column name does not exist in the dataset
    #[error("Column '{column}' does not exist in the dataset")]
    UnknownColumn { column: String },

    /// A value in a declared-numeric column is not a finite number
    #[error("Column '{column}' row {row}: '{value}' is not a number")]
    NumericParse {
        column: String,
        row: usize,
        value: String,
    },

    /// No schema can be derived because the dataset has no records
    #[error("Cannot derive a schema for table '{table}' from a dataset with no records")]
    EmptySchema { table: String },

    /// Any database failure while creating the table or writing records
    #[error("{}", persistence_message(table, *record, source))]
    Persistence {
        table: String,
        /// Position of the record whose insert failed, if the failure was an insert
        record: Option<usize>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

fn persistence_message(table: &str, record: Option<usize>, source: &rusqlite::Error) -> String {
    match record {
        Some(position) => format!(
            "Failed to persist record {} into table '{}': {}. The run was rolled back.",
            position, table, source
        ),
        None => format!("Database error on table '{}': {}", table, source),
    }
}

impl IngestError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn persistence(
        table: impl Into<String>,
        record: Option<usize>,
        source: rusqlite::Error,
    ) -> Self {
        Self::Persistence {
            table: table.into(),
            record,
            source,
        }
    }

    /// Position of the failed record for insert failures
    pub fn failed_record(&self) -> Option<usize> {
        match self {
            Self::Persistence { record, .. } => *record,
            _ => None,
        }
    }
}
