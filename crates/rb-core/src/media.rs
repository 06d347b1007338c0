//! Media-domain enums: categories, quality tiers, codecs, and file kinds.
//!
//! All enums serialize lowercase (snake_case for multi-word variants) so the
//! JSON API and the database share one spelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic category assigned to a catalog entry by the heuristics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    /// A feature film (default for otherwise-unclassified video).
    Movie,
    /// A single TV episode, grouped by series key.
    TvEpisode,
    /// Kids content; checked first and terminal.
    Kids,
    /// A music video, concert, or live performance recording.
    MusicVideo,
    /// An audio file.
    Audio,
    /// An image file.
    Image,
    /// Anything the rule chain could not place.
    Other,
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::TvEpisode => write!(f, "tv_episode"),
            Self::Kids => write!(f, "kids"),
            Self::MusicVideo => write!(f, "music_video"),
            Self::Audio => write!(f, "audio"),
            Self::Image => write!(f, "image"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "tv_episode" => Ok(Self::TvEpisode),
            "kids" => Ok(Self::Kids),
            "music_video" => Ok(Self::MusicVideo),
            "audio" => Ok(Self::Audio),
            "image" => Ok(Self::Image),
            "other" => Ok(Self::Other),
            _ => Err(format!("invalid media category: {s}")),
        }
    }
}

/// Quality tier extracted from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    /// 4K / 2160p / UHD.
    #[serde(rename = "4K")]
    Uhd,
    /// 1080p / FHD.
    #[serde(rename = "1080p")]
    FullHd,
    /// 720p / HD.
    #[serde(rename = "720p")]
    Hd,
    /// 480p / SD.
    #[serde(rename = "480p")]
    Sd,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uhd => write!(f, "4K"),
            Self::FullHd => write!(f, "1080p"),
            Self::Hd => write!(f, "720p"),
            Self::Sd => write!(f, "480p"),
        }
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "4K" => Ok(Self::Uhd),
            "1080p" => Ok(Self::FullHd),
            "720p" => Ok(Self::Hd),
            "480p" => Ok(Self::Sd),
            _ => Err(format!("invalid quality tier: {s}")),
        }
    }
}

/// Video codec extracted from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    #[serde(rename = "H.264")]
    H264,
    #[serde(rename = "H.265")]
    H265,
    #[serde(rename = "VP9")]
    Vp9,
    #[serde(rename = "AV1")]
    Av1,
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264 => write!(f, "H.264"),
            Self::H265 => write!(f, "H.265"),
            Self::Vp9 => write!(f, "VP9"),
            Self::Av1 => write!(f, "AV1"),
        }
    }
}

impl FromStr for VideoCodec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "H.264" => Ok(Self::H264),
            "H.265" => Ok(Self::H265),
            "VP9" => Ok(Self::Vp9),
            "AV1" => Ok(Self::Av1),
            _ => Err(format!("invalid codec: {s}")),
        }
    }
}

/// Broad file kind derived from the extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// How an entry entered the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    /// Discovered by a directory scan; identity is the path.
    Scan,
    /// Received through the upload endpoint; identity is the content hash.
    Upload,
}

impl fmt::Display for EntryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

impl FromStr for EntryOrigin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scan" => Ok(Self::Scan),
            "upload" => Ok(Self::Upload),
            _ => Err(format!("invalid entry origin: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serialization() {
        let json = serde_json::to_string(&MediaCategory::TvEpisode).unwrap();
        assert_eq!(json, r#""tv_episode""#);

        let json = serde_json::to_string(&MediaCategory::MusicVideo).unwrap();
        assert_eq!(json, r#""music_video""#);
    }

    #[test]
    fn category_display_matches_serde() {
        for cat in [
            MediaCategory::Movie,
            MediaCategory::TvEpisode,
            MediaCategory::Kids,
            MediaCategory::MusicVideo,
            MediaCategory::Audio,
            MediaCategory::Image,
            MediaCategory::Other,
        ] {
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{cat}\""));
        }
    }

    #[test]
    fn category_from_str_roundtrip() {
        let cat: MediaCategory = "kids".parse().unwrap();
        assert_eq!(cat, MediaCategory::Kids);
        assert!("nope".parse::<MediaCategory>().is_err());
    }

    #[test]
    fn quality_tier_display() {
        assert_eq!(QualityTier::Uhd.to_string(), "4K");
        assert_eq!(QualityTier::FullHd.to_string(), "1080p");
        assert_eq!(QualityTier::Hd.to_string(), "720p");
        assert_eq!(QualityTier::Sd.to_string(), "480p");
    }

    #[test]
    fn quality_tier_from_str() {
        assert_eq!("1080p".parse::<QualityTier>().unwrap(), QualityTier::FullHd);
        assert!("900p".parse::<QualityTier>().is_err());
    }

    #[test]
    fn codec_display_and_serde() {
        assert_eq!(VideoCodec::H264.to_string(), "H.264");
        let json = serde_json::to_string(&VideoCodec::H265).unwrap();
        assert_eq!(json, r#""H.265""#);
        assert_eq!("VP9".parse::<VideoCodec>().unwrap(), VideoCodec::Vp9);
    }

    #[test]
    fn origin_roundtrip() {
        assert_eq!("upload".parse::<EntryOrigin>().unwrap(), EntryOrigin::Upload);
        assert_eq!(EntryOrigin::Scan.to_string(), "scan");
    }
}
