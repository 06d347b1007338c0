//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`rb_core::Error`] so that route handlers
//! can return `Result<T, AppError>` directly. Every error body carries a
//! machine-readable `code` alongside the human-readable message, so clients
//! branch on kind rather than string-matching prose.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: rb_core::Error,
}

impl AppError {
    pub fn new(inner: rb_core::Error) -> Self {
        Self { inner }
    }

    /// The machine-readable error code for this error.
    pub fn code(&self) -> String {
        match &self.inner {
            rb_core::Error::NotFound { entity, .. } => format!("{entity}_not_found"),
            rb_core::Error::BackingFileMissing { .. } => "backing_file_missing".into(),
            rb_core::Error::UnsupportedFormat(_) => "unsupported_format".into(),
            rb_core::Error::DuplicateContent(_) => "duplicate_content".into(),
            rb_core::Error::ScanInProgress(_) => "scan_in_progress".into(),
            rb_core::Error::InvalidRange(_) => "invalid_range".into(),
            rb_core::Error::Validation(_) => "validation_error".into(),
            rb_core::Error::Database { .. } => "database_error".into(),
            rb_core::Error::Io { .. } => "io_error".into(),
            rb_core::Error::Internal(_) => "internal_error".into(),
        }
    }
}

impl From<rb_core::Error> for AppError {
    fn from(e: rb_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_not_found_produces_404_with_entity_code() {
        let err = AppError::new(rb_core::Error::not_found("entry", "abc"));
        assert_eq!(err.code(), "entry_not_found");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn backing_file_missing_is_distinct_from_entry_not_found() {
        let err = AppError::new(rb_core::Error::backing_file_missing("abc", "/m/x.mkv"));
        assert_eq!(err.code(), "backing_file_missing");
        let response = err.into_response();
        // Same status, different code: callers disambiguate via code.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_content_produces_409() {
        let err = AppError::new(rb_core::Error::DuplicateContent("h".into()));
        assert_eq!(err.code(), "duplicate_content");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unsupported_format_produces_415() {
        let err = AppError::new(rb_core::Error::UnsupportedFormat("exe".into()));
        assert_eq!(err.code(), "unsupported_format");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn validation_produces_400() {
        let err = AppError::new(rb_core::Error::Validation("bad input".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
