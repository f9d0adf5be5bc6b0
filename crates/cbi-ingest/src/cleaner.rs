//! Row filtering for incomplete records and negative outliers
//!
//! Two filters run in one pass, preserving the order of surviving records:
//!
//! - **Missing values**: under [`MissingValuePolicy::DropRow`] any record with
//!   an empty field is removed. Values are never imputed.
//! - **Negative outliers**: a record is removed when a value in one of the
//!   configured outlier-sensitive columns parses as a number below zero.
//!   Non-numeric values in those columns are kept. There is no upper bound
//!   or distribution check.

use crate::error::Result;
use crate::model::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// What to do with records that contain an empty field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Remove the whole record
    #[default]
    DropRow,
    /// Keep the record unchanged
    Keep,
}

impl std::str::FromStr for MissingValuePolicy {
    type Err = crate::error::IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "drop" | "drop_row" | "drop-row" => Ok(Self::DropRow),
            "keep" => Ok(Self::Keep),
            _ => Err(crate::error::IngestError::config(format!(
                "Invalid missing value policy '{}': expected 'drop' or 'keep'",
                s
            ))),
        }
    }
}

/// Cleaner output with per-filter drop counts
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub dataset: Dataset,
    pub dropped_missing: usize,
    pub dropped_outliers: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    policy: MissingValuePolicy,
    outlier_columns: BTreeSet<String>,
}

impl Cleaner {
    pub fn new(policy: MissingValuePolicy) -> Self {
        Self {
            policy,
            outlier_columns: BTreeSet::new(),
        }
    }

    /// Columns in which a negative number marks the record as an outlier
    pub fn with_outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Produce a new dataset without incomplete or outlier records.
    ///
    /// The column list is unchanged. Fails only when an outlier column does
    /// not exist in `dataset`.
    pub fn clean(&self, dataset: &Dataset) -> Result<CleanedDataset> {
        let outlier_indices = self
            .outlier_columns
            .iter()
            .map(|name| dataset.require_column(name))
            .collect::<Result<Vec<_>>>()?;

        let mut dropped_missing = 0;
        let mut dropped_outliers = 0;
        let mut kept = Vec::with_capacity(dataset.len());

        for (row, record) in dataset.records().iter().enumerate() {
            if self.policy == MissingValuePolicy::DropRow
                && record.values().iter().any(|v| v.trim().is_empty())
            {
                debug!(row, "Dropping record with missing value");
                dropped_missing += 1;
                continue;
            }

            if outlier_indices
                .iter()
                .any(|&index| record.get(index).is_some_and(is_negative_number))
            {
                debug!(row, "Dropping record with negative outlier");
                dropped_outliers += 1;
                continue;
            }

            kept.push(record.clone());
        }

        info!(
            remaining = kept.len(),
            dropped_missing, dropped_outliers, "Cleaned dataset"
        );

        Ok(CleanedDataset {
            dataset: dataset.with_records(kept),
            dropped_missing,
            dropped_outliers,
        })
    }
}

fn is_negative_number(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|n| n < 0.0)
        .unwrap_or(false)
}
