//! Uploaded media items and frame geometry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Extensions accepted as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
/// Extensions accepted as video clips.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

/// Kind of uploaded media, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a file name by its lowercase extension.
    ///
    /// Returns `None` for anything outside the allow-list.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Target orientation of the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Orientation of a frame with the given dimensions.
    ///
    /// Square frames count as landscape.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Output resolution for this orientation.
    pub fn resolution(&self) -> Resolution {
        match self {
            Orientation::Portrait => Resolution::PORTRAIT,
            Orientation::Landscape => Resolution::LANDSCAPE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = OrientationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(OrientationParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown orientation: {0}")]
pub struct OrientationParseError(String);

/// Output frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Vertical short-form output (9:16).
    pub const PORTRAIT: Resolution = Resolution {
        width: 1080,
        height: 1920,
    };

    /// Horizontal output (16:9).
    pub const LANDSCAPE: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height of one horizontal third, rounded down.
    pub fn third_height(&self) -> u32 {
        self.height / 3
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Location inside the job workspace
    pub path: PathBuf,
    pub kind: MediaKind,
    /// File name as sent by the client
    pub original_name: String,
    /// Filled in by probing; `None` until probed or when probing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_orientation: Option<Orientation>,
}

impl MediaItem {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind, original_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            original_name: original_name.into(),
            detected_orientation: None,
        }
    }

    /// Copy of this item with a probed orientation attached.
    pub fn with_orientation(&self, orientation: Orientation) -> Self {
        Self {
            detected_orientation: Some(orientation),
            ..self.clone()
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}
