//! Shared data models for the ReelForge pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Uploaded media items and their orientation
//! - Render modes (the five music options)
//! - Caption chunks, segments and timelines
//! - Render jobs and encoding defaults

pub mod encoding;
pub mod job;
pub mod media;
pub mod mode;
pub mod timeline;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{sanitize_title, JobId, RenderJob};
pub use media::{MediaItem, MediaKind, Orientation, OrientationParseError, Resolution};
pub use mode::{RenderMode, RenderModeParseError};
pub use timeline::{CaptionChunk, RenderKind, Segment, Timeline};
