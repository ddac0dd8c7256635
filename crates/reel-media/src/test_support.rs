//! In-process [`Transcoder`] fake for unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::probe::MediaInfo;
use crate::transcoder::Transcoder;

/// Records every command and touches its output file instead of running FFmpeg.
#[derive(Default)]
pub struct RecordingTranscoder {
    commands: Mutex<Vec<FfmpegCommand>>,
    probes: Mutex<HashMap<PathBuf, MediaInfo>>,
    fail_at: Option<usize>,
}

impl RecordingTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th execute call (zero based).
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    pub fn set_probe(&self, path: impl Into<PathBuf>, info: MediaInfo) {
        self.probes.lock().unwrap().insert(path.into(), info);
    }

    pub fn commands(&self) -> Vec<FfmpegCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Input sources of each recorded command, lavfi sources included.
    pub fn input_sources(&self) -> Vec<Vec<String>> {
        self.commands()
            .iter()
            .map(|c| c.inputs().iter().map(|i| i.source.clone()).collect())
            .collect()
    }
}

pub fn clip_info(has_audio: bool) -> MediaInfo {
    MediaInfo {
        duration: 6.0,
        width: 1080,
        height: 1920,
        codec: Some("h264".to_string()),
        has_video: true,
        has_audio,
    }
}

#[async_trait]
impl Transcoder for RecordingTranscoder {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        Ok(self
            .probes
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| clip_info(true)))
    }

    async fn execute(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let index = {
            let mut commands = self.commands.lock().unwrap();
            commands.push(cmd.clone());
            commands.len() - 1
        };
        if self.fail_at == Some(index) {
            return Err(MediaError::ffmpeg_failed("simulated failure", None, Some(1)));
        }
        std::fs::write(cmd.output(), b"media")?;
        Ok(())
    }
}
