//! Pipeline and database configuration
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables and command-line flags (applied by the binary).
//!
//! ```toml
//! file_path = "datasets/sample_data.csv"
//! delimiter = ","
//! table_name = "CustomerData"
//! numeric_columns = ["Age", "Score"]
//! outlier_columns = ["Age"]
//! missing_value_policy = "drop_row"
//!
//! [database]
//! path = "data/customer_behavior.db"
//! busy_timeout_secs = 5
//! ```

use crate::cleaner::MissingValuePolicy;
use crate::error::{IngestError, Result};
use crate::parser::Delimiter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default SQLite database file
pub const DEFAULT_DATABASE_PATH: &str = "./data/customer_behavior.db";

/// Default table the pipeline writes into
pub const DEFAULT_TABLE_NAME: &str = "CustomerData";

/// Default seconds to wait on a locked database
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

/// What one pipeline run ingests and where it goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub file_path: PathBuf,
    pub delimiter: Delimiter,
    /// Columns rescaled to [0, 1]; every value must be numeric
    pub numeric_columns: BTreeSet<String>,
    /// Columns where a negative number marks the record as an outlier
    pub outlier_columns: BTreeSet<String>,
    pub table_name: String,
    pub missing_value_policy: MissingValuePolicy,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::new(),
            delimiter: Delimiter::default(),
            numeric_columns: BTreeSet::new(),
            outlier_columns: BTreeSet::new(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            missing_value_policy: MissingValuePolicy::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl PipelineConfig {
    /// Start from defaults for the given source file
    pub fn for_file(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Load a TOML configuration file; missing keys take their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        Self::from_toml_str(&content)
            .map_err(|e| IngestError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| IngestError::config(e.to_string()))
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_missing_value_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_value_policy = policy;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }

    /// Check the configuration before any file or database is touched
    pub fn validate(&self) -> Result<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(IngestError::config("file path cannot be empty"));
        }

        if self.table_name.trim().is_empty() {
            return Err(IngestError::config("table name cannot be empty"));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(IngestError::config("database path cannot be empty"));
        }

        if let Some(column) = self
            .numeric_columns
            .iter()
            .chain(&self.outlier_columns)
            .find(|c| c.trim().is_empty())
        {
            return Err(IngestError::config(format!(
                "column names cannot be blank (got '{}')",
                column
            )));
        }

        Ok(())
    }
}
