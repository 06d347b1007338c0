//! rb-server: the HTTP layer and the catalog reconciler.
//!
//! Exposes the catalog over axum (ingest, query, series view, range
//! streaming) and owns the directory-scan reconciliation engine.

pub mod context;
pub mod error;
pub mod hasher;
pub mod router;
pub mod routes;
pub mod scanner;

pub use context::AppContext;
pub use error::AppError;
pub use router::build_router;
