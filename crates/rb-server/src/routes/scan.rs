//! Directory reconciliation endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::path::Path;

use crate::context::AppContext;
use crate::error::AppError;
use crate::scanner::{self, ScanOptions};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Root directory to reconcile.
    pub root: String,
    /// Re-derive classification for already-cataloged files.
    #[serde(default)]
    pub reclassify: bool,
    /// Backfill content hashes for scan-discovered entries afterwards.
    #[serde(default)]
    pub backfill_hashes: bool,
}

/// POST /api/scan
pub async fn scan_root(
    State(ctx): State<AppContext>,
    Json(req): Json<ScanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let options = ScanOptions {
        reclassify: req.reclassify,
        backfill_hashes: req.backfill_hashes,
    };
    let report = scanner::reconcile(&ctx, Path::new(&req.root), &options).await?;
    Ok(Json(report))
}
