//! Core enums used throughout the crate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::target::TargetSize;

// Formats the `image` crate can decode. HEIC is left out: it has no decoder.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp", "gif", "webp"];

const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "m4v", "avi", "mkv", "webm"];

/// Kind of media a file holds, as far as compression is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Detect the media kind from a file extension (case-insensitive).
    ///
    /// Returns None for files that cannot be compressed.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Extension used for compressed output of this kind.
    pub fn output_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Preset compression strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Keep most of the quality.
    Light,
    /// Reasonable default.
    #[default]
    Balanced,
    /// Smallest output, visible artifacts.
    Strong,
}

impl std::fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionLevel::Light => write!(f, "Light"),
            CompressionLevel::Balanced => write!(f, "Balanced"),
            CompressionLevel::Strong => write!(f, "Strong"),
        }
    }
}

/// How a file should be compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    /// Fixed quality preset, no size budget.
    Preset(CompressionLevel),
    /// Largest output that fits within the byte budget.
    TargetSize(TargetSize),
}

impl Default for CompressionMode {
    fn default() -> Self {
        CompressionMode::Preset(CompressionLevel::default())
    }
}

impl std::fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionMode::Preset(level) => write!(f, "preset ({})", level),
            CompressionMode::TargetSize(target) => write!(f, "target size ({})", target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_media_kind_case_insensitive() {
        assert_eq!(
            MediaKind::from_path(Path::new("/tmp/Photo.JPG")),
            Some(MediaKind::Image)
        );
        assert_eq!(
            MediaKind::from_path(Path::new("clip.mov")),
            Some(MediaKind::Video)
        );
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn heic_is_not_an_image_kind() {
        assert_eq!(MediaKind::from_path(Path::new("shot.heic")), None);
        assert_eq!(MediaKind::from_path(Path::new("IMG_0001.HEIC")), None);
    }

    #[test]
    fn compression_level_serializes_lowercase() {
        let json = serde_json::to_string(&CompressionLevel::Strong).unwrap();
        assert_eq!(json, "\"strong\"");
    }

    #[test]
    fn default_mode_is_balanced_preset() {
        assert_eq!(
            CompressionMode::default(),
            CompressionMode::Preset(CompressionLevel::Balanced)
        );
    }
}
