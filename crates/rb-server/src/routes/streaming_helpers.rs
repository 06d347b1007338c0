//! Shared streaming helpers: Range parsing and chunked file serving via
//! `ReaderStream`.
//!
//! Implements the partial-content contract: single-range requests get 206
//! with `Content-Range`, unsatisfiable ranges get 416 with
//! `Content-Range: bytes */total`, and malformed Range values are ignored
//! (full 200 body), per RFC 7233. Multi-range requests are served as their
//! first range only.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use rb_core::Error;

/// Streaming chunk size; keeps memory bounded regardless of file size.
const STREAM_CHUNK_BYTES: usize = 64 * 1024;

/// A parsed single byte range, before satisfiability is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=start-` or `bytes=start-end`.
    FromTo(u64, Option<u64>),
    /// `bytes=-N`: the last N bytes.
    Suffix(u64),
}

/// Parse a `Range: bytes=...` header value.
///
/// Only the first range of a multi-range request is considered. Returns
/// `None` for anything malformed, which callers treat as "no Range header"
/// (RFC 7233 permits ignoring invalid ranges).
pub fn parse_range_header(value: &str) -> Option<ByteRange> {
    let ranges = value.strip_prefix("bytes=")?;
    // Multi-range requests: serve the first range only.
    let first = ranges.split(',').next()?.trim();

    let (start_str, end_str) = first.split_once('-')?;
    let start_str = start_str.trim();
    let end_str = end_str.trim();

    match (start_str.is_empty(), end_str.is_empty()) {
        // bytes=-N
        (true, false) => end_str.parse().ok().map(ByteRange::Suffix),
        // bytes=N-
        (false, true) => start_str.parse().ok().map(|s| ByteRange::FromTo(s, None)),
        // bytes=N-M
        (false, false) => {
            let start = start_str.parse().ok()?;
            let end = end_str.parse().ok()?;
            Some(ByteRange::FromTo(start, Some(end)))
        }
        // bytes=-
        (true, true) => None,
    }
}

/// Resolve a parsed range against the file size.
///
/// Returns the inclusive `(start, end)` pair to serve, or `None` when the
/// range is unsatisfiable (416).
pub fn resolve_range(range: ByteRange, file_size: u64) -> Option<(u64, u64)> {
    if file_size == 0 {
        return None;
    }
    match range {
        ByteRange::FromTo(start, end_opt) => {
            if start >= file_size {
                return None;
            }
            let end = end_opt.unwrap_or(file_size - 1).min(file_size - 1);
            if start > end {
                return None;
            }
            Some((start, end))
        }
        ByteRange::Suffix(n) => {
            if n == 0 {
                return None;
            }
            Some((file_size.saturating_sub(n), file_size - 1))
        }
    }
}

fn range_not_satisfiable(file_size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(
            header::CONTENT_RANGE.as_str(),
            format!("bytes */{file_size}"),
        )],
        Body::empty(),
    )
        .into_response()
}

/// Serve a file with range support using chunked streaming.
///
/// `head_only` responses carry the full-file headers and no body, and never
/// open the file.
pub async fn serve_entry_file(
    file_path: &std::path::Path,
    file_size: u64,
    content_type: &str,
    range_header: Option<&str>,
    head_only: bool,
) -> Result<Response, Error> {
    if head_only {
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE.as_str(), content_type.to_string()),
                (header::CONTENT_LENGTH.as_str(), file_size.to_string()),
                (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
            ],
            Body::empty(),
        )
            .into_response());
    }

    let range = range_header.and_then(parse_range_header);

    match range {
        Some(parsed) => {
            let Some((start, end)) = resolve_range(parsed, file_size) else {
                return Ok(range_not_satisfiable(file_size));
            };
            let length = end - start + 1;

            let mut file = tokio::fs::File::open(file_path).await?;
            file.seek(std::io::SeekFrom::Start(start)).await?;

            // Take limits reads to exactly `length` bytes.
            let limited = file.take(length);
            let stream = ReaderStream::with_capacity(limited, STREAM_CHUNK_BYTES);
            let body = Body::from_stream(stream);

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE.as_str(), content_type.to_string()),
                    (
                        header::CONTENT_RANGE.as_str(),
                        format!("bytes {start}-{end}/{file_size}"),
                    ),
                    (header::CONTENT_LENGTH.as_str(), length.to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                body,
            )
                .into_response())
        }
        None => {
            let file = tokio::fs::File::open(file_path).await?;
            let stream = ReaderStream::with_capacity(file, STREAM_CHUNK_BYTES);
            let body = Body::from_stream(stream);

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE.as_str(), content_type.to_string()),
                    (header::CONTENT_LENGTH.as_str(), file_size.to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                body,
            )
                .into_response())
        }
    }
}
