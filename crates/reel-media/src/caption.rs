//! Caption chunking.
//!
//! A caption is split on whitespace and grouped into ordered chunks, one per
//! timeline segment. How many words go into a chunk depends on what else is
//! known about the job: nothing, the number of images, or the length of the
//! narration track.

use reel_models::encoding::{SEGMENT_SECONDS, WORDS_PER_CHUNK};
use reel_models::CaptionChunk;

/// How many words each chunk should hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChunkPolicy {
    /// Fixed chunk size
    Fixed { words_per_chunk: usize },
    /// Default size, shrunk so every image gets its own chunk
    ImageAware { image_count: usize },
    /// One chunk per segment of narration
    NarrationDriven { audio_duration_secs: f64 },
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        ChunkPolicy::Fixed {
            words_per_chunk: WORDS_PER_CHUNK,
        }
    }
}

impl ChunkPolicy {
    /// Resolve the chunk size for a caption of `word_count` words.
    ///
    /// Never returns zero.
    pub fn words_per_chunk(&self, word_count: usize) -> usize {
        let size = match *self {
            ChunkPolicy::Fixed { words_per_chunk } => words_per_chunk,
            ChunkPolicy::ImageAware { image_count } => {
                let default_chunks = word_count.div_ceil(WORDS_PER_CHUNK);
                if image_count > default_chunks {
                    word_count.div_ceil(image_count)
                } else {
                    WORDS_PER_CHUNK
                }
            }
            ChunkPolicy::NarrationDriven { audio_duration_secs } => {
                let chunk_count = segments_for_duration(audio_duration_secs).max(1);
                word_count.div_ceil(chunk_count)
            }
        };
        size.max(1)
    }
}

/// Number of whole segments needed to cover `duration_secs`.
pub fn segments_for_duration(duration_secs: f64) -> usize {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs / SEGMENT_SECONDS).ceil() as usize
}

/// Split on any whitespace, dropping empty tokens.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Group words into ordered chunks of at most `words_per_chunk`.
pub fn chunk_by_words(words: &[&str], words_per_chunk: usize) -> Vec<CaptionChunk> {
    words
        .chunks(words_per_chunk.max(1))
        .enumerate()
        .map(|(index, group)| CaptionChunk::new(index, group.join(" ")))
        .collect()
}

/// Chunk a caption under the given policy.
///
/// An empty caption yields no chunks.
pub fn chunk_caption(text: &str, policy: ChunkPolicy) -> Vec<CaptionChunk> {
    let words = split_words(text);
    if words.is_empty() {
        return Vec::new();
    }
    chunk_by_words(&words, policy.words_per_chunk(words.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_fixed_policy_splits_on_eighteen() {
        let chunks = chunk_caption(&words(36), ChunkPolicy::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].word_count(), 18);
        assert_eq!(chunks[1].index, 1);
        assert!(chunks[1].text.starts_with("w19 "));
    }

    #[test]
    fn test_chunks_reproduce_word_sequence() {
        let text = "  the   quick\tbrown\nfox jumps over the lazy dog  ";
        let chunks = chunk_caption(text, ChunkPolicy::Fixed { words_per_chunk: 4 });
        let joined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
        assert_eq!(joined, split_words(text).join(" "));
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_image_aware_rechunks_when_images_outnumber_chunks() {
        // 36 words default to 2 chunks; 3 images force 12 words per chunk.
        let policy = ChunkPolicy::ImageAware { image_count: 3 };
        assert_eq!(policy.words_per_chunk(36), 12);
        assert_eq!(chunk_caption(&words(36), policy).len(), 3);

        // Fewer images than chunks keeps the default size.
        let policy = ChunkPolicy::ImageAware { image_count: 1 };
        assert_eq!(policy.words_per_chunk(36), 18);
    }

    #[test]
    fn test_narration_driven() {
        // 20 s of audio -> 4 segments -> ceil(30 / 4) = 8 words each.
        let policy = ChunkPolicy::NarrationDriven {
            audio_duration_secs: 20.0,
        };
        assert_eq!(policy.words_per_chunk(30), 8);
        assert_eq!(chunk_caption(&words(30), policy).len(), 4);
    }

    #[test]
    fn test_empty_caption() {
        assert!(chunk_caption("   \n ", ChunkPolicy::ImageAware { image_count: 4 }).is_empty());
        let policy = ChunkPolicy::NarrationDriven {
            audio_duration_secs: 0.0,
        };
        assert_eq!(policy.words_per_chunk(0), 1);
    }

    #[test]
    fn test_segments_for_duration() {
        assert_eq!(segments_for_duration(12.0), 2);
        assert_eq!(segments_for_duration(12.1), 3);
        assert_eq!(segments_for_duration(0.0), 0);
        assert_eq!(segments_for_duration(f64::NAN), 0);
    }
}
