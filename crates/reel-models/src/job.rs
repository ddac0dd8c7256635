//! Render job definitions.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::media::{MediaItem, Orientation, Resolution};
use crate::mode::RenderMode;

/// Longest title prefix kept in output file names.
pub const MAX_TITLE_CHARS: usize = 32;

/// Unique job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used to keep file names unique.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything one upload asks the pipeline to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: JobId,
    pub title: String,
    pub caption: String,
    pub orientation: Orientation,
    pub mode: RenderMode,
    /// Uploaded files in upload order
    pub media: Vec<MediaItem>,
    /// Basename of the artifact in the output directory
    pub output_name: String,
}

impl RenderJob {
    pub fn new(
        title: impl Into<String>,
        caption: impl Into<String>,
        orientation: Orientation,
        mode: RenderMode,
        media: Vec<MediaItem>,
    ) -> Self {
        Self::with_id(JobId::new(), title, caption, orientation, mode, media)
    }

    pub fn with_id(
        id: JobId,
        title: impl Into<String>,
        caption: impl Into<String>,
        orientation: Orientation,
        mode: RenderMode,
        media: Vec<MediaItem>,
    ) -> Self {
        let title = title.into();
        let output_name = format!(
            "{}_output_{}_{}.mp4",
            sanitize_title(&title),
            Utc::now().timestamp_millis(),
            id.short()
        );

        Self {
            id,
            title,
            caption: caption.into(),
            orientation,
            mode,
            media,
            output_name,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.orientation.resolution()
    }

    /// Uploaded images, in upload order.
    pub fn images(&self) -> Vec<MediaItem> {
        self.media.iter().filter(|m| m.is_image()).cloned().collect()
    }

    /// Uploaded video clips, in upload order.
    pub fn videos(&self) -> Vec<MediaItem> {
        self.media.iter().filter(|m| m.is_video()).cloned().collect()
    }
}

/// Make a title safe for use in a file name.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`; the result is cut to
/// [`MAX_TITLE_CHARS`].
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_TITLE_CHARS)
        .collect()
}
