//! Min-max normalization of numeric columns
//!
//! Each named column is rescaled to `[0, 1]` with
//! `(value - min) / (max - min)`, where `min` and `max` are computed over the
//! dataset being normalized. When `max == min` every value in the column
//! becomes `0.0`.
//!
//! Normalizing an already-normalized column is a no-op unless all its values
//! are equal, in which case they collapse to `0.0`.

use crate::error::{IngestError, Result};
use crate::model::{ColumnKind, Dataset};
use serde::Serialize;
use tracing::{debug, info};

/// Observed value range of one column, taken before rescaling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationRange {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

impl NormalizationRange {
    /// Map `value` into `[0, 1]`; a degenerate range maps everything to `0.0`
    pub fn rescale(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }

        let scaled = if span.is_finite() {
            (value - self.min) / span
        } else {
            // Span overflowed; halving every operand keeps it finite
            (value / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        };
        scaled.clamp(0.0, 1.0)
    }
}

/// Normalizer output: the rescaled dataset plus the range used per column
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    pub dataset: Dataset,
    /// One entry per normalized column, in dataset column order
    pub ranges: Vec<NormalizationRange>,
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    columns: Vec<String>,
}

impl Normalizer {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        columns.sort();
        columns.dedup();
        Self { columns }
    }

    /// Rescale the configured columns, returning a new dataset.
    ///
    /// Fails with [`IngestError::UnknownColumn`] for a column the dataset
    /// lacks and with [`IngestError::NumericParse`] for the first value that
    /// is not a finite number.
    pub fn normalize(&self, dataset: &Dataset) -> Result<NormalizedDataset> {
        let mut targets = self
            .columns
            .iter()
            .map(|name| dataset.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        targets.sort_unstable();

        if dataset.is_empty() {
            debug!("Dataset has no records, nothing to normalize");
            return Ok(NormalizedDataset {
                dataset: dataset.clone(),
                ranges: Vec::new(),
            });
        }

        let mut columns = dataset.columns().to_vec();
        let mut records = dataset.records().to_vec();
        let mut ranges = Vec::with_capacity(targets.len());

        for index in targets {
            let name = &columns[index].name;
            let values = parse_column(dataset, index, name)?;
            let range = column_range(name, &values);

            if range.min == range.max {
                debug!(column = %name, value = range.min, "Constant column normalizes to 0.0");
            }

            for (record, value) in records.iter_mut().zip(&values) {
                *record = record.with_value(index, format_value(range.rescale(*value)));
            }

            columns[index].kind = ColumnKind::Numeric;
            ranges.push(range);
        }

        info!(columns = ranges.len(), rows = records.len(), "Normalized dataset");

        Ok(NormalizedDataset {
            dataset: Dataset::with_parts(columns, records),
            ranges,
        })
    }
}

fn parse_column(dataset: &Dataset, index: usize, name: &str) -> Result<Vec<f64>> {
    dataset
        .records()
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let raw = record.get(index).unwrap_or_default();
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| IngestError::NumericParse {
                    column: name.to_string(),
                    row,
                    value: raw.to_string(),
                })
        })
        .collect()
}

fn column_range(name: &str, values: &[f64]) -> NormalizationRange {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    NormalizationRange {
        column: name.to_string(),
        min,
        max,
    }
}

/// Shortest round-trip decimal, never in exponent notation, always with a
/// fractional part
fn format_value(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}
