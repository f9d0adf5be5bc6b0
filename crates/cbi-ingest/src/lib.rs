//! CBI Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads customer-behavior datasets from delimited text files into SQLite.
//!
//! # Stages
//!
//! - **Parser** ([`parser`]): reads a `.csv`/`.txt` file into a [`Dataset`]
//! - **Cleaner** ([`cleaner`]): drops incomplete rows and negative outliers
//! - **Normalizer** ([`normalizer`]): min-max rescales numeric columns
//! - **Schema planning** ([`schema`]): derives an all-`TEXT` table layout
//! - **Persister** ([`persister`]): writes the dataset in one transaction
//!
//! [`Pipeline`] chains the stages from a [`PipelineConfig`].
//!
//! # Example
//!
//! ```no_run
//! use cbi_ingest::{Pipeline, PipelineConfig};
//!
//! fn main() -> cbi_ingest::Result<()> {
//!     let config = PipelineConfig::for_file("datasets/sample_data.csv")
//!         .with_table("CustomerData")
//!         .with_numeric_columns(["Age", "Score"])
//!         .with_database_path("data/customer_behavior.db");
//!
//!     let summary = Pipeline::sqlite(config).run()?;
//!     println!("persisted {} rows", summary.rows_persisted);
//!     Ok(())
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod persister;
pub mod pipeline;
pub mod schema;

// Re-export commonly used types
pub use cleaner::{Cleaner, MissingValuePolicy};
pub use config::PipelineConfig;
pub use error::{IngestError, Result};
pub use model::{Column, ColumnKind, Dataset, Record};
pub use normalizer::{NormalizationRange, Normalizer};
pub use parser::{DelimitedParser, Delimiter};
pub use persister::{PersistReport, Persister, SqlitePersister};
pub use pipeline::{IngestSummary, Pipeline, PipelinePlan};
pub use schema::TablePlan;
