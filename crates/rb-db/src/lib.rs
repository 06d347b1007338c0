//! rb-db: SQLite persistence for the media catalog.
//!
//! Provides the connection pool, embedded schema migrations, row models,
//! and query modules used by the reconciler and the HTTP layer.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
