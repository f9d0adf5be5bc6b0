//! Ingestion pipeline: parse, clean, normalize, persist
//!
//! Stages run in fixed order and the first error aborts the run. Each stage
//! takes the previous stage's dataset by reference and returns a new one, so
//! nothing is shared between runs.

use crate::cleaner::Cleaner;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model::Dataset;
use crate::normalizer::{NormalizationRange, Normalizer};
use crate::parser::DelimitedParser;
use crate::persister::{Persister, SqlitePersister};
use crate::schema::TablePlan;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, info_span};
use uuid::Uuid;

/// Counts and ranges describing one completed run
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub run_id: Uuid,
    pub source: PathBuf,
    pub table: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_parsed: usize,
    pub lines_skipped: usize,
    pub rows_dropped_missing: usize,
    pub rows_dropped_outliers: usize,
    pub ranges: Vec<NormalizationRange>,
    pub rows_persisted: usize,
    /// Rows in the target table once this run committed
    pub table_rows: usize,
}

/// Result of a dry run: what would be written, without touching the database
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub table: TablePlan,
    pub rows: usize,
    pub ranges: Vec<NormalizationRange>,
}

struct Prepared {
    dataset: Dataset,
    rows_parsed: usize,
    lines_skipped: usize,
    rows_dropped_missing: usize,
    rows_dropped_outliers: usize,
    ranges: Vec<NormalizationRange>,
}

pub struct Pipeline<P: Persister> {
    config: PipelineConfig,
    persister: P,
}

impl Pipeline<SqlitePersister> {
    /// Pipeline writing into the SQLite database named by the configuration
    pub fn sqlite(config: PipelineConfig) -> Self {
        let persister = SqlitePersister::new(&config.database.path)
            .with_busy_timeout(config.database.busy_timeout());
        Self::new(config, persister)
    }
}

impl<P: Persister> Pipeline<P> {
    pub fn new(config: PipelineConfig, persister: P) -> Self {
        Self { config, persister }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and persist the result
    pub fn run(&self) -> Result<IngestSummary> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "ingest",
            %run_id,
            file = %self.config.file_path.display(),
            table = %self.config.table_name
        );
        let _enter = span.enter();
        let started_at = Utc::now();

        let prepared = self.prepare()?;
        let report = self
            .persister
            .persist(&prepared.dataset, &self.config.table_name)?;

        let summary = IngestSummary {
            run_id,
            source: self.config.file_path.clone(),
            table: report.table,
            started_at,
            finished_at: Utc::now(),
            rows_parsed: prepared.rows_parsed,
            lines_skipped: prepared.lines_skipped,
            rows_dropped_missing: prepared.rows_dropped_missing,
            rows_dropped_outliers: prepared.rows_dropped_outliers,
            ranges: prepared.ranges,
            rows_persisted: report.rows_inserted,
            table_rows: report.total_rows,
        };

        info!(
            rows_parsed = summary.rows_parsed,
            rows_persisted = summary.rows_persisted,
            "Ingestion run complete"
        );
        Ok(summary)
    }

    /// Run every stage except persistence and report the table plan
    pub fn plan(&self) -> Result<PipelinePlan> {
        self.config.validate()?;

        let _enter = info_span!("plan", file = %self.config.file_path.display()).entered();
        let prepared = self.prepare()?;
        let table = TablePlan::from_dataset(&prepared.dataset, &self.config.table_name)?;

        Ok(PipelinePlan {
            table,
            rows: prepared.dataset.len(),
            ranges: prepared.ranges,
        })
    }

    fn prepare(&self) -> Result<Prepared> {
        let parsed = DelimitedParser::new(self.config.delimiter).parse_file(&self.config.file_path)?;

        let cleaned = Cleaner::new(self.config.missing_value_policy)
            .with_outlier_columns(self.config.outlier_columns.iter().cloned())
            .clean(&parsed.dataset)?;

        let normalized =
            Normalizer::new(self.config.numeric_columns.iter().cloned()).normalize(&cleaned.dataset)?;

        Ok(Prepared {
            rows_parsed: parsed.dataset.len(),
            lines_skipped: parsed.skipped_lines,
            rows_dropped_missing: cleaned.dropped_missing,
            rows_dropped_outliers: cleaned.dropped_outliers,
            ranges: normalized.ranges,
            dataset: normalized.dataset,
        })
    }
}
