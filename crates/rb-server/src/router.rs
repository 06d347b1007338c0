//! Axum router construction.
//!
//! Builds the application router with all route groups, middleware layers,
//! and optional static file serving.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::routes;

/// Build the complete axum router.
pub fn build_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The default 2 MB body limit is far below real media uploads; allow
    // the configured maximum plus multipart framing overhead.
    let body_limit = ctx
        .config
        .upload
        .max_upload_size_mb
        .saturating_mul(1024 * 1024)
        .saturating_add(1024 * 1024) as usize;

    let api = Router::new()
        // Ingest
        .route("/upload", post(routes::upload::upload_entry))
        .route("/scan", post(routes::scan::scan_root))
        // Query
        .route("/entries", get(routes::entries::list_entries))
        .route(
            "/entries/{id}",
            get(routes::entries::get_entry).delete(routes::entries::delete_entry),
        )
        .route("/categories", get(routes::entries::category_counts))
        .route("/series", get(routes::series::list_series))
        .route(
            "/series/{series_key}/episodes",
            get(routes::series::series_episodes),
        )
        // Delivery (GET also serves HEAD)
        .route("/entries/{id}/stream", get(routes::stream::stream_entry));

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Static file serving for a UI build, with SPA fallback.
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                tower_http::services::ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(tower_http::services::ServeFile::new(index_path)),
            );
        }
    }

    app
}
