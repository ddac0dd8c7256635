//! Ordered concatenation of clips.
//!
//! Two clips are joined with one filter-graph concat. Longer lists are folded
//! pairwise in rounds (a merge tree), carrying an odd clip forward, so every
//! FFmpeg call only ever sees two inputs. Uniform segment lists can instead go
//! through the concat demuxer in a single pass.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info};

use reel_models::EncodingConfig;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::{concat_pair_graph, PairAudio, CONCAT_AUDIO_OUTPUT, CONCAT_VIDEO_OUTPUT};
use crate::fs_utils::{move_file, remove_files_quietly};
use crate::transcoder::Transcoder;

/// Silent stereo source standing in for a missing audio track.
const SILENT_AUDIO_SOURCE: &str = "anullsrc=channel_layout=stereo:sample_rate=44100";

/// One round of the pairwise merge tree.
///
/// Indexes refer to the list the round starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRound {
    pub pairs: Vec<(usize, usize)>,
    /// Trailing odd item passed through unmerged
    pub carried: Option<usize>,
}

/// Pair adjacent items until one remains.
///
/// Produces ceil(log2 n) rounds and n - 1 merges; fewer than two items need
/// no rounds.
pub fn plan_merge_tree(n: usize) -> Vec<MergeRound> {
    let mut rounds = Vec::new();
    let mut count = n;

    while count > 1 {
        let pairs = (0..count / 2).map(|i| (2 * i, 2 * i + 1)).collect();
        let carried = (count % 2 == 1).then_some(count - 1);
        rounds.push(MergeRound { pairs, carried });
        count = count / 2 + count % 2;
    }

    rounds
}

/// How a list of clips is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatStrategy {
    /// A single clip is moved into place
    Move,
    /// One two-input concat
    Pair,
    /// Pairwise rounds
    MergeTree { rounds: usize },
}

impl ConcatStrategy {
    /// Strategy for `count` clips; `None` when there is nothing to join.
    pub fn for_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Move),
            2 => Some(Self::Pair),
            n => Some(Self::MergeTree {
                rounds: plan_merge_tree(n).len(),
            }),
        }
    }
}

/// Codec handling for the concat demuxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxMode {
    /// Inputs share codec parameters; copy streams
    StreamCopy,
    /// Re-encode video and drop audio
    ReencodeVideo,
}

/// Contents of a concat demuxer list file.
///
/// Paths are written absolute, with single quotes escaped the way the
/// demuxer's quoting expects.
pub fn concat_list_contents(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| {
            let escaped = p.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

fn absolute(path: &Path) -> MediaResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Joins clips in order through a [`Transcoder`].
#[derive(Clone)]
pub struct ConcatEngine {
    transcoder: Arc<dyn Transcoder>,
    encoding: EncodingConfig,
}

impl ConcatEngine {
    pub fn new(transcoder: Arc<dyn Transcoder>, encoding: EncodingConfig) -> Self {
        Self {
            transcoder,
            encoding,
        }
    }

    /// Join two clips, substituting silence for a missing audio track.
    pub async fn concat_pair(&self, first: &Path, second: &Path, output: &Path) -> MediaResult<()> {
        let first_info = self.transcoder.probe(first).await?;
        let second_info = self.transcoder.probe(second).await?;

        let mut cmd = FfmpegCommand::new(first, output).add_input(second);
        let audio = match (first_info.has_audio, second_info.has_audio) {
            (true, true) => PairAudio::Both,
            (false, false) => PairAudio::None,
            (first_has, _) => {
                let (missing, duration) = if first_has {
                    (1, second_info.duration)
                } else {
                    (0, first_info.duration)
                };
                let silent_clip = if missing == 0 { first } else { second };
                debug!(
                    clip = %silent_clip.display(),
                    "Clip has no audio, substituting silence"
                );
                cmd = cmd
                    .add_lavfi_input(SILENT_AUDIO_SOURCE)
                    .input_duration(duration);
                if missing == 0 {
                    PairAudio::Substituted {
                        first: Some(2),
                        second: None,
                    }
                } else {
                    PairAudio::Substituted {
                        first: None,
                        second: Some(2),
                    }
                }
            }
        };

        cmd = cmd
            .filter_complex(concat_pair_graph(audio).render())
            .map(format!("[{CONCAT_VIDEO_OUTPUT}]"));
        if audio != PairAudio::None {
            cmd = cmd
                .map(format!("[{CONCAT_AUDIO_OUTPUT}]"))
                .audio_codec(&self.encoding.audio_codec);
        }
        let cmd = cmd
            .video_codec(&self.encoding.codec)
            .pixel_format(&self.encoding.pixel_format)
            .preset(&self.encoding.preset)
            .expected_duration(first_info.duration + second_info.duration);

        self.transcoder.execute(&cmd).await
    }

    /// Join any number of clips in order into `output`.
    ///
    /// Intermediates go to `work_dir` and are removed as soon as the round
    /// that consumed them finishes, and on any failure.
    pub async fn merge(&self, inputs: &[PathBuf], output: &Path, work_dir: &Path) -> MediaResult<()> {
        let strategy = ConcatStrategy::for_count(inputs.len())
            .ok_or_else(|| MediaError::internal("No clips to concatenate"))?;

        match strategy {
            ConcatStrategy::Move => move_file(&inputs[0], output).await,
            ConcatStrategy::Pair => self.concat_pair(&inputs[0], &inputs[1], output).await,
            ConcatStrategy::MergeTree { rounds } => {
                info!(clips = inputs.len(), rounds, "Merging clips pairwise");
                self.merge_tree(inputs, output, work_dir).await
            }
        }
    }

    async fn merge_tree(&self, inputs: &[PathBuf], output: &Path, work_dir: &Path) -> MediaResult<()> {
        let plan = plan_merge_tree(inputs.len());
        let mut current: Vec<PathBuf> = inputs.to_vec();
        let mut intermediates: Vec<PathBuf> = Vec::new();

        for (r, round) in plan.iter().enumerate() {
            let last_round = r + 1 == plan.len();
            let mut next = Vec::with_capacity(round.pairs.len() + 1);

            for (i, &(a, b)) in round.pairs.iter().enumerate() {
                let target = if last_round {
                    output.to_path_buf()
                } else {
                    let path = work_dir.join(format!("merge_r{}_{}.mp4", r + 1, i));
                    intermediates.push(path.clone());
                    path
                };

                if let Err(e) = self.concat_pair(&current[a], &current[b], &target).await {
                    remove_files_quietly(&intermediates).await;
                    return Err(e);
                }
                next.push(target);
            }

            if let Some(c) = round.carried {
                next.push(current[c].clone());
            }

            let consumed: Vec<PathBuf> = current
                .iter()
                .filter(|p| intermediates.contains(p) && !next.contains(p))
                .cloned()
                .collect();
            remove_files_quietly(&consumed).await;
            intermediates.retain(|p| !consumed.contains(p));

            debug!(round = r + 1, remaining = next.len(), "Merge round finished");
            current = next;
        }

        Ok(())
    }

    /// Join clips through the concat demuxer using a list file at `list_path`.
    ///
    /// The list file is removed afterwards whether or not FFmpeg succeeds.
    pub async fn concat_demuxer(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        list_path: &Path,
        mode: DemuxMode,
    ) -> MediaResult<()> {
        if inputs.is_empty() {
            return Err(MediaError::internal("No clips to concatenate"));
        }

        let absolute_inputs = inputs
            .iter()
            .map(|p| absolute(p))
            .collect::<MediaResult<Vec<_>>>()?;
        fs::write(list_path, concat_list_contents(&absolute_inputs)).await?;

        let cmd = FfmpegCommand::new(list_path, output).input_args(["-f", "concat", "-safe", "0"]);
        let cmd = match mode {
            DemuxMode::StreamCopy => cmd.codec_copy(),
            DemuxMode::ReencodeVideo => cmd
                .video_codec(&self.encoding.codec)
                .pixel_format(&self.encoding.pixel_format)
                .no_audio(),
        };

        let result = self.transcoder.execute(&cmd).await;
        remove_files_quietly(&[list_path.to_path_buf()]).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clip_info, RecordingTranscoder};
    use tempfile::TempDir;

    fn clips(dir: &Path, n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| {
                let path = dir.join(format!("clip_{i}.mp4"));
                std::fs::write(&path, b"clip").unwrap();
                path
            })
            .collect()
    }

    fn leftover_intermediates(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with("merge_r"))
            .collect()
    }

    #[test]
    fn test_plan_merge_tree_three() {
        let plan = plan_merge_tree(3);
        assert_eq!(
            plan,
            vec![
                MergeRound {
                    pairs: vec![(0, 1)],
                    carried: Some(2)
                },
                MergeRound {
                    pairs: vec![(0, 1)],
                    carried: None
                },
            ]
        );
    }

    #[test]
    fn test_plan_merge_tree_counts() {
        assert!(plan_merge_tree(0).is_empty());
        assert!(plan_merge_tree(1).is_empty());

        for n in 2..=33usize {
            let plan = plan_merge_tree(n);
            let merges: usize = plan.iter().map(|r| r.pairs.len()).sum();
            let expected_rounds = (n as f64).log2().ceil() as usize;
            assert_eq!(merges, n - 1, "n = {n}");
            assert_eq!(plan.len(), expected_rounds, "n = {n}");
            assert_eq!(plan.last().unwrap().pairs.len(), 1);
        }
    }

    #[test]
    fn test_strategy_for_count() {
        assert_eq!(ConcatStrategy::for_count(0), None);
        assert_eq!(ConcatStrategy::for_count(1), Some(ConcatStrategy::Move));
        assert_eq!(ConcatStrategy::for_count(2), Some(ConcatStrategy::Pair));
        assert_eq!(
            ConcatStrategy::for_count(5),
            Some(ConcatStrategy::MergeTree { rounds: 3 })
        );
    }

    #[test]
    fn test_concat_list_contents_escapes_quotes() {
        let list = concat_list_contents(&[
            PathBuf::from("/tmp/job/a.mp4"),
            PathBuf::from("/tmp/job/it's.mp4"),
        ]);
        assert_eq!(list, "file '/tmp/job/a.mp4'\nfile '/tmp/job/it'\\''s.mp4'\n");
    }

    #[tokio::test]
    async fn test_merge_three_preserves_order() {
        let dir = TempDir::new().unwrap();
        let inputs = clips(dir.path(), 3);
        let output = dir.path().join("merged.mp4");
        let fake = Arc::new(RecordingTranscoder::new());
        let engine = ConcatEngine::new(fake.clone(), EncodingConfig::default());

        engine.merge(&inputs, &output, dir.path()).await.unwrap();

        let intermediate = dir.path().join("merge_r1_0.mp4");
        let sources = fake.input_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(
            sources[0],
            vec![inputs[0].to_string_lossy().to_string(), inputs[1].to_string_lossy().to_string()]
        );
        assert_eq!(
            sources[1],
            vec![intermediate.to_string_lossy().to_string(), inputs[2].to_string_lossy().to_string()]
        );
        assert!(output.exists());
        assert!(!intermediate.exists());
    }

    #[tokio::test]
    async fn test_merge_single_clip_moves() {
        let dir = TempDir::new().unwrap();
        let inputs = clips(dir.path(), 1);
        let output = dir.path().join("out").join("final.mp4");
        let fake = Arc::new(RecordingTranscoder::new());
        let engine = ConcatEngine::new(fake.clone(), EncodingConfig::default());

        engine.merge(&inputs, &output, dir.path()).await.unwrap();

        assert!(output.exists());
        assert!(!inputs[0].exists());
        assert!(fake.commands().is_empty());
    }

    #[tokio::test]
    async fn test_merge_empty_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let engine = ConcatEngine::new(Arc::new(RecordingTranscoder::new()), EncodingConfig::default());
        let result = engine.merge(&[], &dir.path().join("out.mp4"), dir.path()).await;
        assert!(matches!(result, Err(MediaError::Internal(_))));
    }

    #[tokio::test]
    async fn test_merge_failure_cleans_intermediates() {
        let dir = TempDir::new().unwrap();
        let inputs = clips(dir.path(), 5);
        let output = dir.path().join("merged.mp4");
        // Calls 0 and 1 succeed (round one), call 2 is the second round.
        let fake = Arc::new(RecordingTranscoder::failing_at(2));
        let engine = ConcatEngine::new(fake.clone(), EncodingConfig::default());

        let result = engine.merge(&inputs, &output, dir.path()).await;

        assert!(matches!(result, Err(MediaError::FfmpegFailed { .. })));
        assert!(leftover_intermediates(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_concat_pair_substitutes_silence() {
        let dir = TempDir::new().unwrap();
        let inputs = clips(dir.path(), 2);
        let fake = Arc::new(RecordingTranscoder::new());
        fake.set_probe(&inputs[1], clip_info(false));
        let engine = ConcatEngine::new(fake.clone(), EncodingConfig::default());

        engine
            .concat_pair(&inputs[0], &inputs[1], &dir.path().join("pair.mp4"))
            .await
            .unwrap();

        let cmd = &fake.commands()[0];
        assert_eq!(cmd.inputs().len(), 3);
        assert!(cmd.inputs()[2].source.starts_with("anullsrc"));
        let line = cmd.build_args().join(" ");
        assert!(line.contains("[0:v:0][0:a:0][1:v:0][2:a:0]concat=n=2:v=1:a=1[outv][outa]"));
        assert!(line.contains("-map [outa]"));
    }

    #[tokio::test]
    async fn test_concat_pair_without_any_audio() {
        let dir = TempDir::new().unwrap();
        let inputs = clips(dir.path(), 2);
        let fake = Arc::new(RecordingTranscoder::new());
        fake.set_probe(&inputs[0], clip_info(false));
        fake.set_probe(&inputs[1], clip_info(false));
        let engine = ConcatEngine::new(fake.clone(), EncodingConfig::default());

        engine
            .concat_pair(&inputs[0], &inputs[1], &dir.path().join("pair.mp4"))
            .await
            .unwrap();

        let line = fake.commands()[0].build_args().join(" ");
        assert!(line.contains("concat=n=2:v=1:a=0[outv]"));
        assert!(!line.contains("[outa]"));
    }

    #[tokio::test]
    async fn test_concat_demuxer_stream_copy() {
        let dir = TempDir::new().unwrap();
        let inputs = clips(dir.path(), 3);
        let list = dir.path().join("concat.txt");
        let output = dir.path().join("joined.mp4");
        let fake = Arc::new(RecordingTranscoder::new());
        let engine = ConcatEngine::new(fake.clone(), EncodingConfig::default());

        engine
            .concat_demuxer(&inputs, &output, &list, DemuxMode::StreamCopy)
            .await
            .unwrap();

        let line = fake.commands()[0].build_args().join(" ");
        assert!(line.contains(&format!("-f concat -safe 0 -i {}", list.display())));
        assert!(line.contains("-c copy"));
        assert!(!list.exists());
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_concat_demuxer_reencode_drops_audio() {
        let dir = TempDir::new().unwrap();
        let inputs = clips(dir.path(), 2);
        let fake = Arc::new(RecordingTranscoder::new());
        let engine = ConcatEngine::new(fake.clone(), EncodingConfig::default());

        engine
            .concat_demuxer(
                &inputs,
                &dir.path().join("joined.mp4"),
                &dir.path().join("concat.txt"),
                DemuxMode::ReencodeVideo,
            )
            .await
            .unwrap();

        let line = fake.commands()[0].build_args().join(" ");
        assert!(line.contains("-c:v libx264 -pix_fmt yuv420p -an"));
    }
}
