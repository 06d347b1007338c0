//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, default config
//! pointed at a scratch media directory, and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts axum on a random port
//! for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use rb_core::config::Config;
use rb_core::{EntryId, EntryOrigin, MediaCategory};
use rb_db::models::CatalogEntry;
use rb_db::pool::{get_conn, init_memory_pool, DbPool, PooledConnection};
use rb_server::{build_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temp media directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    scratch: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory DB.
    pub fn new() -> Self {
        let scratch = tempfile::tempdir().expect("failed to create scratch dir");
        let mut config = Config::default();
        config.server.media_dir = scratch.path().join("media");

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(db.clone(), Arc::new(config));

        Self { ctx, db, scratch }
    }

    /// Start an axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = build_router(harness.ctx.clone(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.db).expect("failed to get db connection")
    }

    /// The media directory uploads land in.
    pub fn media_dir(&self) -> PathBuf {
        self.ctx.config.server.media_dir.clone()
    }

    /// Directory for building scan fixtures.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch.path().to_path_buf()
    }

    /// Insert a catalog entry directly, returning its ID. Used by tests
    /// that need precise control over the stored row.
    pub fn insert_entry(&self, path: &str, mime_type: &str, size_bytes: i64) -> EntryId {
        let entry = CatalogEntry {
            id: EntryId::new(),
            path: path.to_string(),
            content_hash: None,
            file_name: path.rsplit('/').next().unwrap_or(path).to_string(),
            size_bytes,
            mime_type: mime_type.to_string(),
            category: MediaCategory::Movie,
            series_name: None,
            season_number: None,
            episode_number: None,
            series_key: None,
            year: None,
            quality_tier: None,
            codec: None,
            origin: EntryOrigin::Scan,
            created_at: Utc::now().to_rfc3339(),
            last_seen_at: Some(Utc::now().to_rfc3339()),
            last_accessed_at: None,
        };
        rb_db::queries::entries::insert_scan_entry(&self.conn(), &entry)
            .expect("failed to insert entry");
        entry.id
    }
}
