//! Category classification: an ordered rule table, first match wins.
//!
//! The order is load-bearing and is expressed as data rather than nested
//! conditionals: a filename containing both a kids keyword and an episode
//! pattern classifies as `kids`, because the kids rule sits first and is
//! terminal.

use std::sync::OnceLock;

use rb_core::MediaCategory;
use regex::Regex;

/// Keywords marking kids content (case-insensitive substring match).
const KIDS_KEYWORDS: &[&str] = &[
    "kids",
    "children",
    "cartoon",
    "animated",
    "disney",
    "pixar",
    "nickelodeon",
    "cartoon network",
];

/// Keywords marking music videos.
const MUSIC_KEYWORDS: &[&str] = &["music video", "mv", "concert", "live", "performance"];

/// TV episode patterns, matched against the lowercased filename.
const TV_PATTERNS: &[&str] = &[
    r"s\d{2}e\d{2}",  // S01E01
    r"season\s*\d+",  // Season 1
    r"episode\s*\d+", // Episode 1
    r"s\d{2}",        // S01
    r"e\d{2}",        // E01
];

fn tv_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        TV_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("tv pattern is valid"))
            .collect()
    })
}

/// Predicate half of a classification rule.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// Any keyword appears as a substring of the lowercased filename.
    KeywordAny(&'static [&'static str]),
    /// Any TV pattern matches the lowercased filename.
    TvPattern,
    /// The MIME type starts with the given prefix.
    MimePrefix(&'static str),
    /// Always matches; used for the terminal fallback rule.
    Always,
}

impl Predicate {
    fn matches(&self, file_name_lower: &str, mime_type: &str) -> bool {
        match self {
            Predicate::KeywordAny(keywords) => {
                keywords.iter().any(|k| file_name_lower.contains(k))
            }
            Predicate::TvPattern => tv_regexes().iter().any(|re| re.is_match(file_name_lower)),
            Predicate::MimePrefix(prefix) => mime_type.starts_with(prefix),
            Predicate::Always => true,
        }
    }
}

/// One entry in the ordered classification chain.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub predicate: Predicate,
    pub category: MediaCategory,
}

/// The classification chain, in evaluation order.
pub const RULES: &[CategoryRule] = &[
    CategoryRule {
        predicate: Predicate::KeywordAny(KIDS_KEYWORDS),
        category: MediaCategory::Kids,
    },
    CategoryRule {
        predicate: Predicate::TvPattern,
        category: MediaCategory::TvEpisode,
    },
    CategoryRule {
        predicate: Predicate::KeywordAny(MUSIC_KEYWORDS),
        category: MediaCategory::MusicVideo,
    },
    CategoryRule {
        predicate: Predicate::MimePrefix("video/"),
        category: MediaCategory::Movie,
    },
    CategoryRule {
        predicate: Predicate::MimePrefix("audio/"),
        category: MediaCategory::Audio,
    },
    CategoryRule {
        predicate: Predicate::MimePrefix("image/"),
        category: MediaCategory::Image,
    },
    CategoryRule {
        predicate: Predicate::Always,
        category: MediaCategory::Other,
    },
];

/// Classify a filename + MIME type through the rule chain.
pub fn detect_category(file_name: &str, mime_type: &str) -> MediaCategory {
    let lower = file_name.to_lowercase();
    for rule in RULES {
        if rule.predicate.matches(&lower, mime_type) {
            return rule.category;
        }
    }
    // The Always rule makes the chain total.
    MediaCategory::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kids_keyword_wins_over_tv_pattern() {
        assert_eq!(
            detect_category("Kids Cartoon S01E01.mp4", "video/mp4"),
            MediaCategory::Kids
        );
        assert_eq!(
            detect_category("Disney Adventure S02E05.mkv", "video/x-matroska"),
            MediaCategory::Kids
        );
    }

    #[test]
    fn tv_patterns() {
        assert_eq!(
            detect_category("Amazing Series S01E02 1080p x264.mkv", "video/x-matroska"),
            MediaCategory::TvEpisode
        );
        assert_eq!(
            detect_category("Show Season 3.mp4", "video/mp4"),
            MediaCategory::TvEpisode
        );
        assert_eq!(
            detect_category("Show Episode 7.mp4", "video/mp4"),
            MediaCategory::TvEpisode
        );
        assert_eq!(
            detect_category("Show S04.mkv", "video/x-matroska"),
            MediaCategory::TvEpisode
        );
    }

    #[test]
    fn music_video_keywords() {
        assert_eq!(
            detect_category("Awesome Song Music Video.mp4", "video/mp4"),
            MediaCategory::MusicVideo
        );
        assert_eq!(
            detect_category("Band Concert 2019.mp4", "video/mp4"),
            MediaCategory::MusicVideo
        );
    }

    #[test]
    fn mime_fallbacks() {
        assert_eq!(
            detect_category("The Great Adventure (2023).mp4", "video/mp4"),
            MediaCategory::Movie
        );
        assert_eq!(
            detect_category("Great Song.mp3", "audio/mpeg"),
            MediaCategory::Audio
        );
        assert_eq!(
            detect_category("vacation.png", "image/png"),
            MediaCategory::Image
        );
        assert_eq!(
            detect_category("mystery.bin", "application/octet-stream"),
            MediaCategory::Other
        );
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(
            detect_category("PIXAR Shorts Collection.mkv", "video/x-matroska"),
            MediaCategory::Kids
        );
        assert_eq!(
            detect_category("show s01e01.mp4", "video/mp4"),
            MediaCategory::TvEpisode
        );
    }

    #[test]
    fn rule_order_is_explicit() {
        // The table itself encodes precedence; verify the first two rules.
        assert_eq!(RULES[0].category, MediaCategory::Kids);
        assert_eq!(RULES[1].category, MediaCategory::TvEpisode);
        assert_eq!(RULES.last().unwrap().category, MediaCategory::Other);
    }
}
