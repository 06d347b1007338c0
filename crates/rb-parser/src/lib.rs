//! rb-parser: filename heuristics for media classification.
//!
//! Pure, deterministic, side-effect-free derivation of a semantic category,
//! TV series structure, and lightweight metadata from a filename and MIME
//! type. The same input always yields the same output, so classifications
//! can be cached in the catalog and re-derived at any time.
//!
//! # Quick start
//!
//! ```
//! use rb_parser::parse;
//! use rb_core::MediaCategory;
//!
//! let p = parse("Amazing Series S01E02 1080p x264.mkv", "video/x-matroska");
//! assert_eq!(p.category, MediaCategory::TvEpisode);
//! assert_eq!(p.series.series_key, "amazing series_s01");
//! assert_eq!(p.series.season, Some(1));
//! assert_eq!(p.series.episode, Some(2));
//! assert_eq!(p.metadata.quality.unwrap().to_string(), "1080p");
//! assert_eq!(p.metadata.codec.unwrap().to_string(), "H.264");
//! ```

pub mod category;
pub mod episode;
pub mod metadata;
pub mod types;

pub use types::{ExtractedMetadata, ParsedMedia, SeriesParse};

/// Run the full heuristics engine over `(file_name, mime_type)`.
///
/// Category is evaluated through the ordered rule chain (kids keywords
/// first and terminal, then TV patterns, music keywords, MIME prefixes).
/// The series parse and metadata extraction run unconditionally; callers
/// persist series info only for `tv_episode` entries.
pub fn parse(file_name: &str, mime_type: &str) -> ParsedMedia {
    ParsedMedia {
        category: category::detect_category(file_name, mime_type),
        series: episode::parse_series(file_name),
        metadata: metadata::extract_metadata(file_name),
    }
}
