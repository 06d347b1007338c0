//! Path utilities: the supported extension sets and MIME guessing.
//!
//! The extension tables below are the authoritative supported set; files
//! outside it are skipped by the reconciler and rejected by the upload
//! endpoint.

use std::path::Path;

use crate::media::MediaKind;

/// Supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "3gp", "mpg", "mpeg",
];

/// Supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"];

/// Supported image file extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "svg"];

/// Determine the broad media kind of a path from its extension.
///
/// Returns `None` for unsupported extensions (or no extension at all).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use rb_core::paths::media_kind_for_path;
/// use rb_core::MediaKind;
///
/// assert_eq!(media_kind_for_path(Path::new("movie.mkv")), Some(MediaKind::Video));
/// assert_eq!(media_kind_for_path(Path::new("song.flac")), Some(MediaKind::Audio));
/// assert_eq!(media_kind_for_path(Path::new("notes.txt")), None);
/// ```
pub fn media_kind_for_path(path: &Path) -> Option<MediaKind> {
    let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Check whether a path has a supported media extension.
pub fn is_media_file(path: &Path) -> bool {
    media_kind_for_path(path).is_some()
}

/// Guess a MIME type from the path extension.
///
/// Falls back to a generic type per media kind when `mime_guess` has no
/// answer (e.g. `.mkv` on some platforms), so every supported file gets a
/// usable `Content-Type`.
pub fn guess_mime_type(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.essence_str().to_string();
    }
    match media_kind_for_path(path) {
        Some(MediaKind::Video) => "video/mp4".to_string(),
        Some(MediaKind::Audio) => "audio/mpeg".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

/// Get the list of supported video extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Get the list of supported audio extensions.
#[must_use]
pub fn audio_extensions() -> &'static [&'static str] {
    AUDIO_EXTENSIONS
}

/// Get the list of supported image extensions.
#[must_use]
pub fn image_extensions() -> &'static [&'static str] {
    IMAGE_EXTENSIONS
}
