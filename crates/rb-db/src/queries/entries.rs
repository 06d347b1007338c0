//! Catalog entry CRUD, list, and search operations.
//!
//! Both ingest routes go through here: scan inserts are guarded by the
//! `path` UNIQUE constraint (a losing concurrent insert is reported, not an
//! error), and upload inserts fail closed on the `content_hash` UNIQUE
//! constraint so duplicate-content detection is a single atomic statement.

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::Connection;

use rb_core::{EntryId, Error, MediaCategory, QualityTier, Result, VideoCodec};

use crate::models::CatalogEntry;

/// Column list used in SELECT statements; must match
/// [`CatalogEntry::from_row`].
pub const COLS: &str = "id, path, content_hash, file_name, size_bytes, mime_type, category,
    series_name, season_number, episode_number, series_key, year, quality_tier, codec,
    origin, created_at, last_seen_at, last_accessed_at";

/// Filter options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub category: Option<MediaCategory>,
    /// Case-insensitive substring match against the file name.
    pub search: Option<String>,
}

/// Sort field for entry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    FileName,
    SizeBytes,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "file_name" => Ok(Self::FileName),
            "size_bytes" => Ok(Self::SizeBytes),
            _ => Err(format!("invalid sort field: {s}")),
        }
    }
}

/// Sort options.
#[derive(Debug, Clone, Copy)]
pub struct SortOptions {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

/// Pagination options.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

fn insert_statement(on_conflict: &str) -> String {
    format!(
        "INSERT INTO entries (
            id, path, content_hash, file_name, size_bytes, mime_type, category,
            series_name, season_number, episode_number, series_key, year,
            quality_tier, codec, origin, created_at, last_seen_at, last_accessed_at
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)
         {on_conflict}"
    )
}

fn bind_insert(
    conn: &Connection,
    sql: &str,
    entry: &CatalogEntry,
) -> std::result::Result<usize, rusqlite::Error> {
    conn.execute(
        sql,
        rusqlite::params![
            entry.id.to_string(),
            entry.path,
            entry.content_hash,
            entry.file_name,
            entry.size_bytes,
            entry.mime_type,
            entry.category.to_string(),
            entry.series_name,
            entry.season_number,
            entry.episode_number,
            entry.series_key,
            entry.year,
            entry.quality_tier.map(|q| q.to_string()),
            entry.codec.map(|c| c.to_string()),
            entry.origin.to_string(),
            entry.created_at,
            entry.last_seen_at,
            entry.last_accessed_at,
        ],
    )
}

/// Insert a scan-discovered entry.
///
/// Returns `Ok(true)` when the row was inserted, `Ok(false)` when another
/// writer already owns the path (the caller should re-read and treat the
/// file as existing).
pub fn insert_scan_entry(conn: &Connection, entry: &CatalogEntry) -> Result<bool> {
    let sql = insert_statement("ON CONFLICT(path) DO NOTHING");
    let n = bind_insert(conn, &sql, entry).map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Insert an upload-discovered entry.
///
/// The `content_hash` UNIQUE constraint makes the duplicate check and the
/// insert one atomic statement: a collision surfaces as
/// [`Error::DuplicateContent`] and no catalog mutation occurs.
pub fn insert_upload_entry(conn: &Connection, entry: &CatalogEntry) -> Result<()> {
    let sql = insert_statement("");
    match bind_insert(conn, &sql, entry) {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, Some(msg)))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("entries.content_hash") =>
        {
            Err(Error::DuplicateContent(
                entry.content_hash.clone().unwrap_or_default(),
            ))
        }
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get an entry by ID.
pub fn get_entry(conn: &Connection, id: EntryId) -> Result<Option<CatalogEntry>> {
    let q = format!("SELECT {COLS} FROM entries WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], CatalogEntry::from_row);
    match result {
        Ok(e) => Ok(Some(e)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get an entry by its absolute path.
pub fn get_entry_by_path(conn: &Connection, path: &str) -> Result<Option<CatalogEntry>> {
    let q = format!("SELECT {COLS} FROM entries WHERE path = ?1");
    let result = conn.query_row(&q, [path], CatalogEntry::from_row);
    match result {
        Ok(e) => Ok(Some(e)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get an entry by its content hash.
pub fn get_entry_by_hash(conn: &Connection, hash: &str) -> Result<Option<CatalogEntry>> {
    let q = format!("SELECT {COLS} FROM entries WHERE content_hash = ?1");
    let result = conn.query_row(&q, [hash], CatalogEntry::from_row);
    match result {
        Ok(e) => Ok(Some(e)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Refresh `size_bytes` and `last_seen_at` for a scan pass that found the
/// file again.
pub fn mark_seen(conn: &Connection, id: EntryId, size_bytes: i64) -> Result<()> {
    conn.execute(
        "UPDATE entries SET size_bytes = ?1, last_seen_at = ?2 WHERE id = ?3",
        rusqlite::params![size_bytes, Utc::now().to_rfc3339(), id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Overwrite the cached classification of an entry.
///
/// Used by the explicit reclassification pass; the category is cached, not
/// hand-authored, so this is always safe.
#[allow(clippy::too_many_arguments)]
pub fn update_classification(
    conn: &Connection,
    id: EntryId,
    category: MediaCategory,
    series_name: Option<&str>,
    season_number: Option<i64>,
    episode_number: Option<i64>,
    series_key: Option<&str>,
    year: Option<i64>,
    quality_tier: Option<QualityTier>,
    codec: Option<VideoCodec>,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE entries SET category=?1, series_name=?2, season_number=?3,
                episode_number=?4, series_key=?5, year=?6, quality_tier=?7, codec=?8
             WHERE id=?9",
            rusqlite::params![
                category.to_string(),
                series_name,
                season_number,
                episode_number,
                series_key,
                year,
                quality_tier.map(|q| q.to_string()),
                codec.map(|c| c.to_string()),
                id.to_string(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Backfill a content hash for a scan-discovered entry.
///
/// Returns `Ok(false)` when the hash is already owned by another live entry
/// (the caller logs and skips; identities are never merged silently).
pub fn set_content_hash(conn: &Connection, id: EntryId, hash: &str) -> Result<bool> {
    match conn.execute(
        "UPDATE entries SET content_hash = ?1 WHERE id = ?2",
        rusqlite::params![hash, id.to_string()],
    ) {
        Ok(n) => Ok(n > 0),
        Err(rusqlite::Error::SqliteFailure(err, Some(msg)))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("entries.content_hash") =>
        {
            Ok(false)
        }
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Record a playback access. Best-effort by design; callers ignore failures.
pub fn touch_last_accessed(conn: &Connection, id: EntryId) -> Result<()> {
    conn.execute(
        "UPDATE entries SET last_accessed_at = ?1 WHERE id = ?2",
        rusqlite::params![Utc::now().to_rfc3339(), id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Delete an entry row. The backing file is the caller's concern.
pub fn delete_entry(conn: &Connection, id: EntryId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM entries WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

fn filter_clause(filter: &EntryFilter) -> (String, Vec<rusqlite::types::Value>) {
    let mut conditions = Vec::new();
    let mut values: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(category) = filter.category {
        conditions.push(format!("category = ?{}", values.len() + 1));
        values.push(category.to_string().into());
    }
    if let Some(ref search) = filter.search {
        // LIKE is case-insensitive for ASCII in SQLite.
        conditions.push(format!("file_name LIKE ?{}", values.len() + 1));
        values.push(format!("%{search}%").into());
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

/// List entries with filtering, sorting, and offset/limit pagination.
pub fn list_entries(
    conn: &Connection,
    filter: &EntryFilter,
    sort: &SortOptions,
    pagination: &Pagination,
) -> Result<Vec<CatalogEntry>> {
    let (clause, mut values) = filter_clause(filter);

    let order_col = match sort.field {
        SortField::CreatedAt => "created_at",
        SortField::FileName => "file_name COLLATE NOCASE",
        SortField::SizeBytes => "size_bytes",
    };
    let direction = if sort.descending { "DESC" } else { "ASC" };

    let q = format!(
        "SELECT {COLS} FROM entries {clause}
         ORDER BY {order_col} {direction}, rowid {direction}
         LIMIT ?{} OFFSET ?{}",
        values.len() + 1,
        values.len() + 2,
    );
    values.push(i64::from(pagination.limit).into());
    values.push(i64::from(pagination.offset).into());

    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values), CatalogEntry::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Count entries matching a filter.
pub fn count_entries(conn: &Connection, filter: &EntryFilter) -> Result<i64> {
    let (clause, values) = filter_clause(filter);
    let q = format!("SELECT COUNT(*) FROM entries {clause}");
    conn.query_row(&q, rusqlite::params_from_iter(values), |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

/// Per-category entry counts for the whole catalog.
pub fn category_counts(conn: &Connection) -> Result<BTreeMap<String, i64>> {
    let mut stmt = conn
        .prepare("SELECT category, COUNT(*) FROM entries GROUP BY category")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows.into_iter().collect())
}

/// All known paths beginning with a prefix. The reconciler loads these into
/// a set upfront instead of issuing a per-file existence query.
pub fn list_paths_with_prefix(conn: &Connection, prefix: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT path FROM entries WHERE path LIKE ?1")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([format!("{prefix}%")], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Scan-discovered entries that have no content hash yet, oldest first.
pub fn list_unhashed(conn: &Connection, limit: i64) -> Result<Vec<CatalogEntry>> {
    let q = format!(
        "SELECT {COLS} FROM entries
         WHERE content_hash IS NULL AND origin = 'scan'
         ORDER BY created_at ASC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([limit], CatalogEntry::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
