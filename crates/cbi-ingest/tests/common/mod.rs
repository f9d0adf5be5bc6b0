//! Shared helpers for cbi-ingest integration tests
#![allow(dead_code)]

use cbi_ingest::schema::quote_identifier;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path to a checked-in fixture under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Write `content` to `name` inside the temp dir and return its path
pub fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("failed to write test source");
    path
}

pub fn count_rows(db: &Path, table: &str) -> i64 {
    let conn = Connection::open(db).expect("failed to open test database");
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
        [],
        |row| row.get(0),
    )
    .expect("failed to count rows")
}

pub fn table_exists(db: &Path, table: &str) -> bool {
    if !db.exists() {
        return false;
    }
    let conn = Connection::open(db).expect("failed to open test database");
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .expect("failed to query sqlite_master");
    count == 1
}

/// All values of one column in insertion order
pub fn column_values(db: &Path, table: &str, column: &str) -> Vec<String> {
    let conn = Connection::open(db).expect("failed to open test database");
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            quote_identifier(column),
            quote_identifier(table)
        ))
        .expect("failed to prepare select");
    stmt.query_map([], |row| row.get(0))
        .expect("failed to query column")
        .collect::<Result<Vec<String>, _>>()
        .expect("failed to read column")
}

/// Make every insert of a row whose `column` equals `value` abort
pub fn fail_inserts_where(db: &Path, table: &str, column: &str, value: &str) {
    let conn = Connection::open(db).expect("failed to open test database");
    conn.execute_batch(&format!(
        "CREATE TRIGGER forced_failure BEFORE INSERT ON {table}
         WHEN NEW.{column} = '{value}'
         BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
        table = quote_identifier(table),
        column = quote_identifier(column),
        value = value.replace('\'', "''"),
    ))
    .expect("failed to install failure trigger");
}
