//! Year, quality tier, and codec extraction from filenames.
//!
//! All extraction is best-effort: each field is an ordered first-match
//! table, and a miss yields an absent field, never an error.

use std::sync::OnceLock;

use rb_core::{QualityTier, VideoCodec};
use regex::Regex;

use crate::types::ExtractedMetadata;

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("year pattern is valid"))
}

/// Quality patterns, in precedence order. Later patterns are not evaluated
/// once one matches.
const QUALITY_PATTERNS: &[(&str, QualityTier)] = &[
    (r"\b(4k|2160p|uhd)\b", QualityTier::Uhd),
    (r"\b(1080p|fhd)\b", QualityTier::FullHd),
    (r"\b(720p|hd)\b", QualityTier::Hd),
    (r"\b(480p|sd)\b", QualityTier::Sd),
];

/// Codec patterns, in precedence order.
const CODEC_PATTERNS: &[(&str, VideoCodec)] = &[
    (r"\b(h264|x264)\b", VideoCodec::H264),
    (r"\b(h265|x265|hevc)\b", VideoCodec::H265),
    (r"\b(vp9)\b", VideoCodec::Vp9),
    (r"\b(av1)\b", VideoCodec::Av1),
];

fn quality_regexes() -> &'static [(Regex, QualityTier)] {
    static REGEXES: OnceLock<Vec<(Regex, QualityTier)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        QUALITY_PATTERNS
            .iter()
            .map(|(p, q)| (Regex::new(p).expect("quality pattern is valid"), *q))
            .collect()
    })
}

fn codec_regexes() -> &'static [(Regex, VideoCodec)] {
    static REGEXES: OnceLock<Vec<(Regex, VideoCodec)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        CODEC_PATTERNS
            .iter()
            .map(|(p, c)| (Regex::new(p).expect("codec pattern is valid"), *c))
            .collect()
    })
}

/// Extract year, quality tier, and codec from a filename.
pub fn extract_metadata(file_name: &str) -> ExtractedMetadata {
    let lower = file_name.to_lowercase();

    let year = year_regex()
        .captures(file_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok());

    let quality = quality_regexes()
        .iter()
        .find(|(re, _)| re.is_match(&lower))
        .map(|(_, q)| *q);

    let codec = codec_regexes()
        .iter()
        .find(|(re, _)| re.is_match(&lower))
        .map(|(_, c)| *c);

    ExtractedMetadata {
        year,
        quality,
        codec,
    }
}
