//! Season/episode extraction and series-key derivation.
//!
//! The parse is unconditional and side-effect-free; callers persist the
//! result only for entries classified as TV episodes. Two files with the
//! same derived series name and season always produce the same key, even
//! across different original filename formats.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::SeriesParse;

fn season_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"s(\d{2})").expect("season pattern is valid"))
}

fn episode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"e(\d{2})").expect("episode pattern is valid"))
}

/// Strip the final extension, if any, so it never leaks into series names.
fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains(' ') => stem,
        _ => file_name,
    }
}

/// Replace filename punctuation with spaces and trim.
fn clean_name(raw: &str) -> String {
    raw.replace(['.', '_', '-'], " ").trim().to_string()
}

/// Parse season, episode, and the grouping key from a filename.
///
/// - Season := first `s(\d{2})` match (case-insensitive).
/// - Episode := first `e(\d{2})` match (case-insensitive).
/// - Series name := the substring preceding the earliest matched token,
///   with `.`/`_`/`-` replaced by spaces and trimmed. When no token
///   matched, the whole stem is used.
/// - Key := `lowercase(name) + "_sNN"` when a season was found, else
///   `lowercase(name)`.
pub fn parse_series(file_name: &str) -> SeriesParse {
    let stem = file_stem(file_name);
    let lower = stem.to_lowercase();

    let season_m = season_regex().captures(&lower);
    let episode_m = episode_regex().captures(&lower);

    let season = season_m
        .as_ref()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());
    let episode = episode_m
        .as_ref()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    // The series name precedes the earliest season-or-episode token.
    let season_start = season_m.as_ref().and_then(|c| c.get(0)).map(|m| m.start());
    let episode_start = episode_m.as_ref().and_then(|c| c.get(0)).map(|m| m.start());
    let cut = match (season_start, episode_start) {
        (Some(s), Some(e)) => Some(s.min(e)),
        (Some(s), None) => Some(s),
        (None, Some(e)) => Some(e),
        (None, None) => None,
    };

    let series_name = match cut {
        Some(idx) => clean_name(&stem[..idx]),
        None => clean_name(stem),
    };

    let series_key = match season {
        Some(s) => format!("{}_s{s:02}", series_name.to_lowercase()),
        None => series_name.to_lowercase(),
    };

    SeriesParse {
        series_name,
        season,
        episode,
        series_key,
    }
}
