//! CBI Ingest - load delimited customer-behavior files into SQLite

use anyhow::{Context, Result};
use cbi_common::logging::{init_logging, LogConfig, LogLevel};
use cbi_ingest::{Delimiter, IngestSummary, MissingValuePolicy, Pipeline, PipelineConfig};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cbi-ingest")]
#[command(author, version, about = "Customer behavior dataset ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pipeline configuration file (TOML); flags and environment override it
    #[arg(short, long, global = true, env = "CBI_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, clean, normalize and persist each file in order
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print each run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the table each file would produce without writing to the database
    Plan {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Source file (.csv or .txt); repeat to ingest several files into one table
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Target table name
    #[arg(short, long, env = "CBI_TABLE_NAME")]
    table: Option<String>,

    /// Field delimiter: a single character, or tab/comma/pipe/semicolon/space
    #[arg(short, long, env = "CBI_DELIMITER")]
    delimiter: Option<Delimiter>,

    /// Column to min-max normalize (repeatable)
    #[arg(short, long = "numeric")]
    numeric: Vec<String>,

    /// Column in which negative numbers mark outliers (repeatable)
    #[arg(short, long = "outlier")]
    outlier: Vec<String>,

    /// Missing value policy: drop or keep
    #[arg(short, long)]
    missing: Option<MissingValuePolicy>,

    /// SQLite database file
    #[arg(long, env = "CBI_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Seconds to wait on a locked database
    #[arg(long, env = "CBI_BUSY_TIMEOUT_SECS")]
    busy_timeout_secs: Option<u64>,
}

impl PipelineArgs {
    /// Files to process, falling back to the one named in the config file
    fn sources(&self, base: &PipelineConfig) -> Vec<PathBuf> {
        if self.files.is_empty() {
            vec![base.file_path.clone()]
        } else {
            self.files.clone()
        }
    }

    fn configure(&self, base: &PipelineConfig, file: &Path) -> PipelineConfig {
        let mut config = base.clone();
        config.file_path = file.to_path_buf();

        if let Some(table) = &self.table {
            config.table_name = table.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if !self.numeric.is_empty() {
            config.numeric_columns = self.numeric.iter().cloned().collect();
        }
        if !self.outlier.is_empty() {
            config.outlier_columns = self.outlier.iter().cloned().collect();
        }
        if let Some(policy) = self.missing {
            config.missing_value_policy = policy;
        }
        if let Some(database) = &self.database {
            config.database.path = database.clone();
        }
        if let Some(secs) = self.busy_timeout_secs {
            config.database.busy_timeout_secs = secs;
        }

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("cbi-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let base = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Run { pipeline, json } => {
            for file in pipeline.sources(&base) {
                let config = pipeline.configure(&base, &file);
                let summary = tokio::task::spawn_blocking(move || Pipeline::sqlite(config).run())
                    .await
                    .context("Ingestion task panicked")?
                    .with_context(|| format!("Failed to ingest {}", file.display()))?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    print_summary(&summary);
                }
            }
        },
        Command::Plan { pipeline } => {
            for file in pipeline.sources(&base) {
                let config = pipeline.configure(&base, &file);
                let plan = tokio::task::spawn_blocking(move || Pipeline::sqlite(config).plan())
                    .await
                    .context("Planning task panicked")?
                    .with_context(|| format!("Failed to plan {}", file.display()))?;

                println!("-- {} ({} rows)", file.display(), plan.rows);
                for range in &plan.ranges {
                    println!("-- {}: min {} max {}", range.column, range.min, range.max);
                }
                println!("{};", plan.table.create_table_sql());
            }
        },
    }

    info!("Ingestion complete");
    Ok(())
}

fn print_summary(summary: &IngestSummary) {
    println!(
        "{}: {} rows parsed, {} malformed lines skipped, {} incomplete and {} outlier rows dropped",
        summary.source.display(),
        summary.rows_parsed,
        summary.lines_skipped,
        summary.rows_dropped_missing,
        summary.rows_dropped_outliers,
    );
    println!(
        "  stored {} rows in '{}' ({} rows total)",
        summary.rows_persisted, summary.table, summary.table_rows
    );
}
