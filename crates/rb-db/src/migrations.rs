//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;

use rb_core::{Error, Result};

/// V1: initial schema -- the catalog table and its indexes.
const V1_INITIAL: &str = r#"
-- Catalog entries: one row per known physical media file. Holds both
-- identity keys: path (scan route) and content_hash (upload route).
CREATE TABLE entries (
    id               TEXT PRIMARY KEY,
    path             TEXT NOT NULL UNIQUE,
    content_hash     TEXT UNIQUE,
    file_name        TEXT NOT NULL,
    size_bytes       INTEGER NOT NULL,
    mime_type        TEXT NOT NULL,
    category         TEXT NOT NULL,
    series_name      TEXT,
    season_number    INTEGER,
    episode_number   INTEGER,
    series_key       TEXT,
    year             INTEGER,
    quality_tier     TEXT,
    codec            TEXT,
    origin           TEXT NOT NULL DEFAULT 'scan',
    created_at       TEXT NOT NULL,
    last_seen_at     TEXT,
    last_accessed_at TEXT
);

CREATE INDEX idx_entries_category   ON entries(category);
CREATE INDEX idx_entries_series_key ON entries(series_key);
CREATE INDEX idx_entries_created_at ON entries(created_at);
"#;

/// All migrations, in application order.
const MIGRATIONS: &[(i64, &str, &str)] = &[(1, "initial", V1_INITIAL)];

/// Ensure the tracking table exists.
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY NOT NULL,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Current schema version, or 0 when nothing has been applied.
fn current_version(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Run all pending migrations.
///
/// Each migration executes inside its own transaction together with its
/// tracking row, so a failure leaves the schema at the previous version.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;
    let current = current_version(conn)?;

    for (version, name, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }

        tracing::info!(version, name, "Applying migration");

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;
        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("migration {version} ({name}) failed: {e}")))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![version, name],
        )
        .map_err(|e| Error::database(e.to_string()))?;
        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}
