//! Unified error type for the reelbase application.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in reelbase.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "entry", "series").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A catalog entry exists but its backing file is gone from disk.
    #[error("backing file missing for entry {id}: {path}")]
    BackingFileMissing {
        /// The entry whose file vanished.
        id: String,
        /// The path that was expected to exist.
        path: String,
    },

    /// The file extension / MIME type is outside the supported set.
    #[error("unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// An upload's content hash collides with a live catalog entry.
    #[error("duplicate content: an entry with hash {0} already exists")]
    DuplicateContent(String),

    /// A reconciliation pass is already running for the given root.
    #[error("scan already in progress for {0}")]
    ScanInProgress(String),

    /// A Range header was syntactically valid but cannot be satisfied.
    #[error("range not satisfiable: {0}")]
    InvalidRange(String),

    /// Request data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A database operation failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::BackingFileMissing { .. } => 404,
            Error::UnsupportedFormat(_) => 415,
            Error::DuplicateContent(_) => 409,
            Error::ScanInProgress(_) => 409,
            Error::InvalidRange(_) => 416,
            Error::Validation(_) => 400,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::BackingFileMissing`].
    pub fn backing_file_missing(id: impl fmt::Display, path: impl Into<String>) -> Self {
        Error::BackingFileMissing {
            id: id.to_string(),
            path: path.into(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
