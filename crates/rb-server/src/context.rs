//! Application context shared by all request handlers (via axum state).

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

use rb_core::config::Config;
use rb_db::pool::DbPool;

/// Application context shared by all request handlers.
///
/// Cheaply cloneable: it only holds the pool handle and `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Roots with a reconciliation pass currently running. A second scan of
    /// the same root is refused while its key is present.
    pub active_scans: Arc<DashMap<PathBuf, ()>>,
}

impl AppContext {
    /// Build a context from a pool and configuration.
    pub fn new(db: DbPool, config: Arc<Config>) -> Self {
        Self {
            db,
            config,
            active_scans: Arc::new(DashMap::new()),
        }
    }
}
