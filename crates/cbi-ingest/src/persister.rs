//! Dataset persistence
//!
//! [`SqlitePersister`] writes a dataset into a SQLite table:
//!
//! 1. Plan the table from the dataset ([`TablePlan`]); zero records is an error.
//! 2. Open a connection scoped to this call.
//! 3. Inside one transaction, `CREATE TABLE IF NOT EXISTS` and insert every
//!    record with bound parameters.
//! 4. Commit. Any failure drops the transaction, which rolls back every insert
//!    of the run (and the table creation, if this run created it).
//!
//! Tables have no key constraints, so re-running the same file appends the
//! rows again.

use crate::error::{IngestError, Result};
use crate::model::Dataset;
use crate::schema::{quote_identifier, TablePlan};
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Default time to wait on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one successful persist call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub table: String,
    pub rows_inserted: usize,
    /// Rows in the table after this run committed
    pub total_rows: usize,
}

/// Destination for cleaned datasets
pub trait Persister: Send + Sync {
    /// Write every record of `dataset` into `table` atomically
    fn persist(&self, dataset: &Dataset, table: &str) -> Result<PersistReport>;
}

/// SQLite-backed persister. Opens a fresh connection for every call.
#[derive(Debug, Clone)]
pub struct SqlitePersister {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl SqlitePersister {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// How long to wait for another writer to release the database
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self, table: &str) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;
        }

        let conn =
            Connection::open(&self.db_path).map_err(|e| IngestError::persistence(table, None, e))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| IngestError::persistence(table, None, e))?;

        debug!(path = %self.db_path.display(), "Opened database connection");
        Ok(conn)
    }
}

impl Persister for SqlitePersister {
    #[instrument(skip(self, dataset), fields(rows = dataset.len()))]
    fn persist(&self, dataset: &Dataset, table: &str) -> Result<PersistReport> {
        let plan = TablePlan::from_dataset(dataset, table)?;
        let db_err = |e| IngestError::persistence(table, None, e);

        let mut conn = self.open(table)?;
        let tx = conn.transaction().map_err(db_err)?;

        tx.execute(&plan.create_table_sql(), []).map_err(db_err)?;
        debug!(table, columns = plan.columns.len(), "Table created or already exists");

        {
            let mut insert = tx.prepare(&plan.insert_sql()).map_err(db_err)?;
            for (position, record) in dataset.records().iter().enumerate() {
                insert
                    .execute(params_from_iter(record.values()))
                    .map_err(|e| IngestError::persistence(table, Some(position), e))?;
            }
        }

        let total_rows: i64 = tx
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
                [],
                |row| row.get(0),
            )
            .map_err(db_err)?;

        tx.commit().map_err(db_err)?;
        conn.close().map_err(|(_, e)| db_err(e))?;

        let report = PersistReport {
            table: table.to_string(),
            rows_inserted: dataset.len(),
            total_rows: usize::try_from(total_rows).unwrap_or_default(),
        };
        info!(
            table,
            rows_inserted = report.rows_inserted,
            total_rows = report.total_rows,
            "Persisted dataset"
        );

        Ok(report)
    }
}
