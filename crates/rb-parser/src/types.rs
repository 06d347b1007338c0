//! Output types for the filename heuristics engine.

use rb_core::{MediaCategory, QualityTier, VideoCodec};
use serde::{Deserialize, Serialize};

/// Everything the heuristics engine derives from `(file_name, mime_type)`.
///
/// All fields are populated on a best-effort basis; classification always
/// yields a category, while series and metadata fields are `None` when the
/// corresponding token is not found in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMedia {
    /// The first-matching category from the ordered rule chain.
    pub category: MediaCategory,
    /// Series parse result. Computed unconditionally; callers decide whether
    /// to persist it (only `tv_episode` entries carry series info).
    pub series: SeriesParse,
    /// Derived metadata; never authoritative.
    pub metadata: ExtractedMetadata,
}

/// Season/episode structure parsed from a filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesParse {
    /// Cleaned series name (punctuation replaced with spaces, trimmed).
    pub series_name: String,
    /// Season number from an `S##` token. `None` when only word patterns
    /// (`Season N`) matched; grouping defaults it to 1 but the absence
    /// stays observable.
    pub season: Option<u32>,
    /// Episode number from an `E##` token; same `None` semantics as season.
    pub episode: Option<u32>,
    /// Grouping identity: `lowercase(name) + "_sNN"` when a season was
    /// parsed, else `lowercase(name)`.
    pub series_key: String,
}

/// Lightweight metadata extracted from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub year: Option<u16>,
    pub quality: Option<QualityTier>,
    pub codec: Option<VideoCodec>,
}

impl ExtractedMetadata {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.quality.is_none() && self.codec.is_none()
    }
}
