#![deny(unreachable_patterns)]
//! Media stages of the ReelForge pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and filter graphs
//! - Progress parsing from `-progress pipe:2`, timeouts and cancellation
//! - Caption chunking and timeline planning
//! - Still-frame composition with word-wrapped captions
//! - Clip synthesis, ordered concatenation and audio binding
//! - External narration synthesis

pub mod assets;
pub mod audio;
pub mod caption;
pub mod clip;
pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod frame;
pub mod fs_utils;
pub mod layout;
pub mod narration;
pub mod probe;
pub mod progress;
pub mod text;
pub mod timeline;
pub mod transcoder;

#[cfg(test)]
pub(crate) mod test_support;

pub use assets::AssetCatalog;
pub use audio::{loop_count, AudioBinder, AudioBinding};
pub use caption::{chunk_caption, segments_for_duration, ChunkPolicy};
pub use clip::ClipSynthesizer;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_list_contents, plan_merge_tree, ConcatEngine, ConcatStrategy, DemuxMode};
pub use error::{MediaError, MediaResult};
pub use frame::{ComposedFrame, FrameComposer, FrameSpec};
pub use fs_utils::{move_file, remove_files_quietly};
pub use layout::{FrameLayout, PortraitStyle, WrappedText};
pub use narration::{sanitize_narration_text, CommandNarrator, NarrationSynthesizer};
pub use probe::{probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use text::{FontdueText, TextRenderer};
pub use timeline::{plan_timeline, TimelineTarget};
pub use transcoder::{FfmpegTranscoder, Transcoder};
