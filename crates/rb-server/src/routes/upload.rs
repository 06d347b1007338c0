//! Multipart upload ingest.
//!
//! The upload is staged to a temporary file, hashed, and inserted with the
//! content-hash UNIQUE constraint as the duplicate check, then renamed into
//! the media directory. Every failure path removes the staged file, so a
//! rejected duplicate never leaves an orphan on disk.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use std::path::Path;

use rb_core::paths::{guess_mime_type, media_kind_for_path};
use rb_core::{EntryId, EntryOrigin, Error, MediaCategory};
use rb_db::models::CatalogEntry;
use rb_db::pool::get_conn;
use rb_db::queries::entries as q_entries;

use crate::context::AppContext;
use crate::error::AppError;
use crate::hasher::ContentHasher;
use crate::routes::entries::EntryResponse;

/// POST /api/upload (multipart, field `file`)
pub async fn upload_entry(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file_part: Option<(String, Option<String>, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("").to_string();
            let declared_mime = field.content_type().map(|m| m.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("failed to read upload: {e}")))?;
            file_part = Some((file_name, declared_mime, bytes));
        }
    }

    let (file_name, declared_mime, data) =
        file_part.ok_or_else(|| Error::Validation("missing multipart field 'file'".into()))?;
    if file_name.is_empty() {
        return Err(Error::Validation("upload has no filename".into()).into());
    }

    let max_bytes = ctx.config.upload.max_upload_size_mb.saturating_mul(1024 * 1024);
    if data.len() as u64 > max_bytes {
        return Err(Error::Validation(format!(
            "upload exceeds the {} MB limit",
            ctx.config.upload.max_upload_size_mb
        ))
        .into());
    }

    // Extension gate: outside the supported set is user-correctable 415.
    if media_kind_for_path(Path::new(&file_name)).is_none() {
        let ext = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        return Err(Error::UnsupportedFormat(ext).into());
    }
    let ext = Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_lowercase();

    let mime_type = declared_mime
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| guess_mime_type(Path::new(&file_name)));

    // Digest before the file is durably placed.
    let mut hasher = ContentHasher::new();
    hasher.update(&data);
    let content_hash = hasher.finalize();

    let media_dir = ctx.config.server.media_dir.clone();
    tokio::fs::create_dir_all(&media_dir)
        .await
        .map_err(Error::from)?;

    let id = EntryId::new();
    let temp_path = media_dir.join(format!(".upload-{id}.{ext}"));
    let final_path = media_dir.join(format!("{id}.{ext}"));

    tokio::fs::write(&temp_path, &data)
        .await
        .map_err(Error::from)?;

    let parsed = rb_parser::parse(&file_name, &mime_type);
    let (series_name, season, episode, series_key) =
        if parsed.category == MediaCategory::TvEpisode {
            let s = &parsed.series;
            (
                Some(s.series_name.clone()),
                s.season.map(i64::from),
                s.episode.map(i64::from),
                Some(s.series_key.clone()),
            )
        } else {
            (None, None, None, None)
        };

    let entry = CatalogEntry {
        id,
        path: final_path.to_string_lossy().to_string(),
        content_hash: Some(content_hash),
        file_name: file_name.clone(),
        size_bytes: data.len() as i64,
        mime_type,
        category: parsed.category,
        series_name,
        season_number: season,
        episode_number: episode,
        series_key,
        year: parsed.metadata.year.map(i64::from),
        quality_tier: parsed.metadata.quality,
        codec: parsed.metadata.codec,
        origin: EntryOrigin::Upload,
        created_at: Utc::now().to_rfc3339(),
        last_seen_at: None,
        last_accessed_at: None,
    };

    // Check-and-insert is one atomic statement; a duplicate fails closed
    // with no catalog mutation.
    let insert_result = {
        let conn = get_conn(&ctx.db)?;
        q_entries::insert_upload_entry(&conn, &entry)
    };
    if let Err(e) = insert_result {
        if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
            tracing::warn!(file = %temp_path.display(), error = %cleanup, "Failed to remove staged upload");
        }
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
        // The row exists but the file could not be placed: roll back.
        if let Ok(conn) = get_conn(&ctx.db) {
            let _ = q_entries::delete_entry(&conn, id);
        }
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(Error::from(e).into());
    }

    tracing::info!(
        file = %file_name,
        entry = %id,
        category = %entry.category,
        "Upload cataloged"
    );

    Ok((StatusCode::CREATED, Json(EntryResponse::from(entry))))
}
