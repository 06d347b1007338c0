//! Catalog entry API routes: list, get, delete, category counts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use rb_core::{EntryId, Error, MediaCategory};
use rb_db::models::CatalogEntry;
use rb_db::pool::get_conn;
use rb_db::queries::entries as q_entries;

use crate::context::AppContext;
use crate::error::AppError;

/// Series structure of a TV episode entry. Present iff the entry's
/// category is `tv_episode`.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesInfoResponse {
    pub series_name: Option<String>,
    pub season: Option<i64>,
    pub episode: Option<i64>,
    pub series_key: Option<String>,
}

/// Derived filename metadata; present when at least one field was found.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

/// Catalog entry as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub id: String,
    pub path: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_info: Option<SeriesInfoResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_metadata: Option<MetadataResponse>,
    pub origin: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<String>,
}

impl From<CatalogEntry> for EntryResponse {
    fn from(e: CatalogEntry) -> Self {
        let series_info = if e.category == MediaCategory::TvEpisode {
            Some(SeriesInfoResponse {
                series_name: e.series_name.clone(),
                season: e.season_number,
                episode: e.episode_number,
                series_key: e.series_key.clone(),
            })
        } else {
            None
        };

        let extracted_metadata =
            if e.year.is_some() || e.quality_tier.is_some() || e.codec.is_some() {
                Some(MetadataResponse {
                    year: e.year,
                    quality_tier: e.quality_tier.map(|q| q.to_string()),
                    codec: e.codec.map(|c| c.to_string()),
                })
            } else {
                None
            };

        Self {
            id: e.id.to_string(),
            path: e.path,
            file_name: e.file_name,
            size_bytes: e.size_bytes,
            mime_type: e.mime_type,
            category: e.category.to_string(),
            content_hash: e.content_hash,
            series_info,
            extracted_metadata,
            origin: e.origin.to_string(),
            created_at: e.created_at,
            last_seen_at: e.last_seen_at,
            last_accessed_at: e.last_accessed_at,
        }
    }
}

/// Paginated list of entries.
#[derive(Debug, Serialize)]
pub struct EntriesListResponse {
    pub entries: Vec<EntryResponse>,
    pub total_count: i64,
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// GET /api/entries
pub async fn list_entries(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let category = query
        .category
        .as_deref()
        .map(|s| s.parse::<MediaCategory>())
        .transpose()
        .map_err(Error::Validation)?;

    let field = query
        .sort_by
        .as_deref()
        .map(|s| s.parse::<q_entries::SortField>())
        .transpose()
        .map_err(Error::Validation)?
        .unwrap_or_default();

    let descending = match query.sort_order.as_deref() {
        None | Some("desc") => true,
        Some("asc") => false,
        Some(other) => {
            return Err(Error::Validation(format!("invalid sort order: {other}")).into())
        }
    };

    let filter = q_entries::EntryFilter {
        category,
        search: query.search,
    };
    let sort = q_entries::SortOptions { field, descending };
    let pagination = q_entries::Pagination {
        offset: query.offset,
        limit: query.limit.min(500),
    };

    let conn = get_conn(&ctx.db)?;
    let total_count = q_entries::count_entries(&conn, &filter)?;
    let entries = q_entries::list_entries(&conn, &filter, &sort, &pagination)?
        .into_iter()
        .map(EntryResponse::from)
        .collect();

    Ok(Json(EntriesListResponse {
        entries,
        total_count,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}

/// GET /api/entries/{id}
pub async fn get_entry(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry_id: EntryId = id
        .parse()
        .map_err(|_| Error::Validation(format!("invalid entry id: {id}")))?;

    let conn = get_conn(&ctx.db)?;
    let entry = q_entries::get_entry(&conn, entry_id)?
        .ok_or_else(|| Error::not_found("entry", entry_id))?;

    Ok(Json(EntryResponse::from(entry)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Also remove the backing file from disk. Off by default; removal is
    /// the caller's explicit choice, never implicit.
    #[serde(default)]
    pub delete_file: bool,
}

/// DELETE /api/entries/{id}
pub async fn delete_entry(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entry_id: EntryId = id
        .parse()
        .map_err(|_| Error::Validation(format!("invalid entry id: {id}")))?;

    let entry = {
        let conn = get_conn(&ctx.db)?;
        q_entries::get_entry(&conn, entry_id)?
            .ok_or_else(|| Error::not_found("entry", entry_id))?
    };

    if query.delete_file {
        match tokio::fs::remove_file(&entry.path).await {
            Ok(()) => {
                tracing::info!(file = %entry.path, "Removed backing file");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %entry.path, "Backing file already absent");
            }
            Err(e) => {
                tracing::warn!(file = %entry.path, error = %e, "Failed to remove backing file");
            }
        }
    }

    let conn = get_conn(&ctx.db)?;
    q_entries::delete_entry(&conn, entry_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/categories
pub async fn category_counts(
    State(ctx): State<AppContext>,
) -> Result<impl IntoResponse, AppError> {
    let conn = get_conn(&ctx.db)?;
    let counts = q_entries::category_counts(&conn)?;
    Ok(Json(counts))
}
