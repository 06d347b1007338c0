//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use rb_core::{EntryId, EntryOrigin, MediaCategory, QualityTier, VideoCodec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

/// Error wrapper for enum columns whose `FromStr` error is a plain String.
#[derive(Debug)]
struct ParseFieldError(String);

impl std::fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseFieldError {}

/// Parse a text column into a `FromStr<Err = String>` enum.
fn parse_enum<T: std::str::FromStr<Err = String>>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(ParseFieldError(e)),
        )
    })
}

/// Parse a nullable text column into an optional enum.
fn parse_opt_enum<T: std::str::FromStr<Err = String>>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        Some(v) => v.parse().map(Some).map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(ParseFieldError(e)),
            )
        }),
        None => Ok(None),
    }
}

/// One physical media file known to the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    /// Absolute filesystem path; the reconciliation identity key.
    pub path: String,
    /// SHA-256 digest of file bytes; the upload identity key. `None` for
    /// scan-only entries that were never hashed.
    pub content_hash: Option<String>,
    pub file_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub category: MediaCategory,
    pub series_name: Option<String>,
    pub season_number: Option<i64>,
    pub episode_number: Option<i64>,
    pub series_key: Option<String>,
    pub year: Option<i64>,
    pub quality_tier: Option<QualityTier>,
    pub codec: Option<VideoCodec>,
    pub origin: EntryOrigin,
    pub created_at: String,
    pub last_seen_at: Option<String>,
    pub last_accessed_at: Option<String>,
}

impl CatalogEntry {
    /// Build from a row selected with [`crate::queries::entries::COLS`].
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            path: row.get(1)?,
            content_hash: row.get(2)?,
            file_name: row.get(3)?,
            size_bytes: row.get(4)?,
            mime_type: row.get(5)?,
            category: parse_enum(row, 6)?,
            series_name: row.get(7)?,
            season_number: row.get(8)?,
            episode_number: row.get(9)?,
            series_key: row.get(10)?,
            year: row.get(11)?,
            quality_tier: parse_opt_enum(row, 12)?,
            codec: parse_opt_enum(row, 13)?,
            origin: parse_enum(row, 14)?,
            created_at: row.get(15)?,
            last_seen_at: row.get(16)?,
            last_accessed_at: row.get(17)?,
        })
    }

    /// Season number with the grouping default applied (absent -> 1).
    pub fn grouping_season(&self) -> i64 {
        self.season_number.unwrap_or(1)
    }

    /// Episode number with the grouping default applied (absent -> 1).
    pub fn grouping_episode(&self) -> i64 {
        self.episode_number.unwrap_or(1)
    }
}
