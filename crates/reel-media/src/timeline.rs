//! Timeline planning for captioned slideshows.

use reel_models::encoding::SEGMENT_SECONDS;
use reel_models::{CaptionChunk, MediaItem, RenderKind, Segment, Timeline};

use crate::caption::segments_for_duration;

/// What the finished video has to cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineTarget {
    /// One fixed-length segment per image or chunk
    Segments,
    /// Exactly the length of a narration track
    Narration { audio_duration_secs: f64 },
}

/// Reconcile images with caption chunks.
///
/// The segment count is the larger of the two; images repeat round-robin when
/// chunks outnumber them, and trailing segments go uncaptioned when images
/// outnumber chunks. With a narration target the count is raised so the
/// segments cover the whole track, and the total is the track length.
pub fn plan_timeline(
    images: &[MediaItem],
    chunks: &[CaptionChunk],
    target: TimelineTarget,
) -> Timeline {
    let mut count = images.len().max(chunks.len());

    let total_duration = match target {
        TimelineTarget::Segments => count as f64 * SEGMENT_SECONDS,
        TimelineTarget::Narration {
            audio_duration_secs,
        } => {
            count = count.max(segments_for_duration(audio_duration_secs));
            audio_duration_secs
        }
    };

    let segments = (0..count)
        .map(|index| Segment {
            index,
            source_media: if images.is_empty() {
                None
            } else {
                Some(images[index % images.len()].clone())
            },
            caption: chunks.get(index).cloned(),
            duration_secs: SEGMENT_SECONDS,
            render_kind: RenderKind::ComposedFrame,
        })
        .collect();

    Timeline {
        segments,
        total_duration,
    }
}
