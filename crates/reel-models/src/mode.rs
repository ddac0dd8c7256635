//! Render mode selection (the form's music option).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The five mutually exclusive ways a job can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Captioned image slideshow over looped background music
    #[default]
    Default,
    /// Captioned image slideshow over generated narration
    Ai,
    /// Normalize and join clips, keeping their own audio
    MergeOnly,
    /// Banner-transform and join clips, keeping their own audio
    TransformMerge,
    /// Banner-transform, join, and lay background music under the result
    TransformAddMusic,
}

impl RenderMode {
    pub const ALL: &'static [RenderMode] = &[
        RenderMode::Default,
        RenderMode::Ai,
        RenderMode::MergeOnly,
        RenderMode::TransformMerge,
        RenderMode::TransformAddMusic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Default => "default",
            RenderMode::Ai => "ai",
            RenderMode::MergeOnly => "merge_only",
            RenderMode::TransformMerge => "transform_merge",
            RenderMode::TransformAddMusic => "transform_add_music",
        }
    }

    /// Whether this mode renders captioned still frames.
    pub fn uses_images(&self) -> bool {
        matches!(self, RenderMode::Default | RenderMode::Ai)
    }

    /// Whether this mode consumes uploaded video clips.
    pub fn uses_videos(&self) -> bool {
        !self.uses_images()
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = RenderModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "default" => Ok(RenderMode::Default),
            "ai" => Ok(RenderMode::Ai),
            "merge_only" => Ok(RenderMode::MergeOnly),
            "transform_merge" => Ok(RenderMode::TransformMerge),
            "transform_add_music" => Ok(RenderMode::TransformAddMusic),
            _ => Err(RenderModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown render mode: {0}")]
pub struct RenderModeParseError(String);
