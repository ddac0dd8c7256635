//! Caption chunks, segments and the per-job timeline.

use serde::{Deserialize, Serialize};

use crate::media::MediaItem;

/// One ordered slice of the caption's words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionChunk {
    pub index: usize,
    pub text: String,
}

impl CaptionChunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// How a segment becomes a video file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    /// Captioned still frame encoded to a faded silent clip
    ComposedFrame,
    /// Uploaded clip scaled, padded and overlaid with banners
    TransformedClip,
    /// Uploaded clip re-encoded to the target size
    PassthroughClip,
}

/// One unit of the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    /// Image or clip shown; `None` for a caption-only frame
    pub source_media: Option<MediaItem>,
    pub caption: Option<CaptionChunk>,
    pub duration_secs: f64,
    pub render_kind: RenderKind,
}

/// Ordered segments plus the duration they are expected to cover.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub segments: Vec<Segment>,
    /// Target length of the finished video in seconds
    pub total_duration: f64,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of the individual segment durations.
    pub fn segment_sum(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }

    /// Whether the final render has to be trimmed to `total_duration`.
    pub fn needs_trim(&self) -> bool {
        (self.segment_sum() - self.total_duration).abs() > f64::EPSILON
    }
}
