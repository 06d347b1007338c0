//! Range-delivery streaming of catalog entry backing files.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method};
use axum::response::Response;

use rb_core::{EntryId, Error};
use rb_db::pool::get_conn;
use rb_db::queries::entries as q_entries;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::streaming_helpers::serve_entry_file;

/// GET|HEAD /api/entries/{id}/stream
///
/// Serves the entry's backing file with byte-range support. A catalog miss
/// and a disk miss are both 404, but with distinct error codes
/// (`entry_not_found` vs `backing_file_missing`) so operators can detect
/// catalog/disk drift.
pub async fn stream_entry(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let entry_id: EntryId = id
        .parse()
        .map_err(|_| Error::Validation(format!("invalid entry id: {id}")))?;

    let entry = {
        let conn = get_conn(&ctx.db)?;
        q_entries::get_entry(&conn, entry_id)?
            .ok_or_else(|| Error::not_found("entry", entry_id))?
    };

    let file_path = std::path::PathBuf::from(&entry.path);
    let metadata = tokio::fs::metadata(&file_path)
        .await
        .map_err(|_| Error::backing_file_missing(entry.id, entry.path.clone()))?;

    // Record the access without ever blocking or failing the response.
    let db = ctx.db.clone();
    tokio::spawn(async move {
        match get_conn(&db) {
            Ok(conn) => {
                if let Err(e) = q_entries::touch_last_accessed(&conn, entry_id) {
                    tracing::debug!(entry = %entry_id, error = %e, "Failed to record access time");
                }
            }
            Err(e) => {
                tracing::debug!(entry = %entry_id, error = %e, "No connection for access-time update");
            }
        }
    });

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    Ok(serve_entry_file(
        &file_path,
        metadata.len(),
        &entry.mime_type,
        range_header.as_deref(),
        method == Method::HEAD,
    )
    .await?)
}
