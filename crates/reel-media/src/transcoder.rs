//! The single seam through which external media processes run.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_media, MediaInfo};

/// Inspect and transcode media files.
///
/// Every composition, concatenation and audio binding step goes through this
/// trait, so a pipeline can be exercised without FFmpeg installed.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Read duration, geometry and stream layout of a file.
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo>;

    /// Run one FFmpeg invocation to completion.
    async fn execute(&self, cmd: &FfmpegCommand) -> MediaResult<()>;
}

/// [`Transcoder`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    runner: FfmpegRunner,
    timeout_secs: Option<u64>,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any single process that runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        match self.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), probe_media(path))
                .await
                .map_err(|_| MediaError::Timeout(secs))?,
            None => probe_media(path).await,
        }
    }

    async fn execute(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let start = Instant::now();
        let result = self.runner.run(cmd).await;
        let elapsed = start.elapsed().as_secs_f64();

        let outcome = if result.is_ok() { "ok" } else { "error" };
        counter!("reel_ffmpeg_invocations_total", "outcome" => outcome).increment(1);
        histogram!("reel_ffmpeg_duration_seconds").record(elapsed);
        debug!(
            output = %cmd.output().display(),
            elapsed_secs = elapsed,
            outcome,
            "FFmpeg invocation finished"
        );

        result
    }
}
