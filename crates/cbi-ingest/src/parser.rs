//! Delimited text parser
//!
//! Reads a `.csv` or `.txt` file whose first line names the columns and whose
//! remaining lines hold one record each. Fields are split literally on a
//! single-byte delimiter (no quote handling) and trimmed.
//!
//! Lines whose field count differs from the header, or that are not valid
//! UTF-8, are skipped rather than fatal. The number of skipped lines is
//! reported in [`ParsedDataset`].

use crate::error::{IngestError, Result};
use crate::model::{check_column_names, Column, Dataset};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// File extensions the parser accepts (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Single-byte field separator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Delimiter(u8);

impl Delimiter {
    pub const COMMA: Delimiter = Delimiter(b',');
    pub const TAB: Delimiter = Delimiter(b'\t');

    pub fn as_byte(self) -> u8 {
        self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::COMMA
    }
}

impl std::str::FromStr for Delimiter {
    type Err = IngestError;

    /// Accepts a single ASCII character or one of `tab`, `\t`, `comma`,
    /// `pipe`, `semicolon`, `space`.
    fn from_str(s: &str) -> Result<Self> {
        let byte = match s.to_ascii_lowercase().as_str() {
            "tab" | "\\t" | "\t" => b'\t',
            "comma" => b',',
            "pipe" => b'|',
            "semicolon" => b';',
            "space" => b' ',
            _ => match s.as_bytes() {
                [b] if b.is_ascii() && !matches!(*b, b'\n' | b'\r') => *b,
                _ => {
                    return Err(IngestError::config(format!(
                        "Invalid delimiter '{}': expected a single ASCII character or one of tab, comma, pipe, semicolon, space",
                        s.escape_default()
                    )))
                },
            },
        };
        Ok(Self(byte))
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            b'\t' => f.write_str("\\t"),
            b => write!(f, "{}", b as char),
        }
    }
}

impl TryFrom<String> for Delimiter {
    type Error = IngestError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Delimiter> for String {
    fn from(value: Delimiter) -> Self {
        value.to_string()
    }
}

/// Parser output: the dataset plus how many data lines were dropped
#[derive(Debug, Clone)]
pub struct ParsedDataset {
    pub dataset: Dataset,
    /// Data lines skipped for a field count mismatch or invalid UTF-8
    pub skipped_lines: usize,
}

/// Parser for delimited text files
#[derive(Debug, Clone, Default)]
pub struct DelimitedParser {
    delimiter: Delimiter,
}

impl DelimitedParser {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// Parse the file at `path` into a dataset.
    ///
    /// The extension is checked before the file is opened.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedDataset> {
        let path = path.as_ref();
        check_extension(path)?;

        let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
        self.parse_reader(file, path)
    }

    /// Parse already-opened content. `source` is used for error context only.
    pub fn parse_reader<R: Read>(&self, reader: R, source: &Path) -> Result<ParsedDataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter.as_byte())
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = reader.byte_records();

        let header = match rows.next() {
            Some(header) => header.map_err(|e| read_error(source, e))?,
            None => {
                return Err(IngestError::EmptyDataset {
                    path: source.to_path_buf(),
                })
            },
        };
        let columns = header_columns(header, source)?;
        debug!(path = %source.display(), columns = columns.len(), "Parsed header");

        let mut dataset = Dataset::empty(columns);
        let expected = dataset.columns().len();
        let mut skipped_lines = 0;

        for row in rows {
            let row = row.map_err(|e| read_error(source, e))?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();

            let mut row = match csv::StringRecord::from_byte_record(row) {
                Ok(row) => row,
                Err(e) => {
                    warn!(
                        path = %source.display(),
                        line,
                        error = %e,
                        "Skipping line that is not valid UTF-8"
                    );
                    skipped_lines += 1;
                    continue;
                },
            };
            row.trim();

            if row.len() != expected {
                warn!(
                    path = %source.display(),
                    line,
                    expected,
                    actual = row.len(),
                    "Skipping line with mismatched field count"
                );
                skipped_lines += 1;
                continue;
            }
            dataset.push_unchecked(row.iter().map(str::to_string).collect());
        }

        info!(
            path = %source.display(),
            rows = dataset.len(),
            skipped_lines,
            "Parsed delimited file"
        );

        Ok(ParsedDataset {
            dataset,
            skipped_lines,
        })
    }
}

/// Reject paths whose extension is not in [`SUPPORTED_EXTENSIONS`]
pub fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        })
    }
}

fn header_columns(header: csv::ByteRecord, source: &Path) -> Result<Vec<Column>> {
    let invalid = |reason: String| IngestError::InvalidHeader {
        path: source.to_path_buf(),
        reason,
    };

    let mut header = csv::StringRecord::from_byte_record(header)
        .map_err(|e| invalid(format!("header is not valid UTF-8 ({})", e)))?;
    header.trim();

    let names: Vec<&str> = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            if index == 0 {
                name.trim_start_matches('\u{feff}').trim()
            } else {
                name
            }
        })
        .collect();

    check_column_names(names.iter().copied()).map_err(invalid)?;
    Ok(names.into_iter().map(Column::text).collect())
}

fn read_error(path: &Path, err: csv::Error) -> IngestError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => IngestError::io(path, source),
        _ => IngestError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, message),
        ),
    }
}
