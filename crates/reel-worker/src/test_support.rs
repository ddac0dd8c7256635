//! Fakes shared by the worker's unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;

use reel_media::{
    FfmpegCommand, MediaError, MediaInfo, MediaResult, NarrationSynthesizer, TextRenderer, Transcoder,
};

/// Records commands and writes placeholder outputs instead of running FFmpeg.
#[derive(Default)]
pub struct RecordingTranscoder {
    commands: Mutex<Vec<FfmpegCommand>>,
    probed: Mutex<Vec<PathBuf>>,
    probes: Mutex<HashMap<PathBuf, MediaInfo>>,
    probes_by_name: Mutex<HashMap<String, MediaInfo>>,
    broken: Mutex<HashSet<PathBuf>>,
    fail_at: Option<usize>,
    delay: Option<Duration>,
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

    /// Sleep this long inside every execute call.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_probe(&self, path: &Path, info: MediaInfo) {
        self.probes.lock().unwrap().insert(path.to_path_buf(), info);
    }

    /// Probe result for any file with this name, wherever it lives.
    pub fn set_probe_by_name(&self, name: &str, info: MediaInfo) {
        self.probes_by_name.lock().unwrap().insert(name.to_string(), info);
    }

    pub fn fail_probe(&self, path: &Path) {
        self.broken.lock().unwrap().insert(path.to_path_buf());
    }

    pub fn commands(&self) -> Vec<FfmpegCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Every path passed to `probe`, in call order.
    pub fn probed(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

pub fn video_info(width: u32, height: u32, has_audio: bool) -> MediaInfo {
    MediaInfo {
        duration: 6.0,
        width,
        height,
        codec: Some("h264".to_string()),
        has_video: true,
        has_audio,
    }
}

#[async_trait]
impl Transcoder for RecordingTranscoder {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        self.probed.lock().unwrap().push(path.to_path_buf());
        if self.broken.lock().unwrap().contains(path) {
            return Err(MediaError::ffprobe_failed("unreadable", None));
        }
        if let Some(info) = self.probes.lock().unwrap().get(path) {
            return Ok(info.clone());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(self
            .probes_by_name
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or_else(|| video_info(1080, 1920, true)))
    }

    async fn execute(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let index = {
            let mut commands = self.commands.lock().unwrap();
            commands.push(cmd.clone());
            commands.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_at == Some(index) {
            return Err(MediaError::ffmpeg_failed("simulated failure", None, Some(1)));
        }
        std::fs::write(cmd.output(), b"media")?;
        Ok(())
    }
}

/// Text renderer with fixed-width glyphs that draws nothing.
pub struct FakeText;

impl TextRenderer for FakeText {
    fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.5
    }

    fn draw(&self, _canvas: &mut RgbaImage, _text: &str, _size: f32, _x: f32, _center_y: f32, _color: [u8; 4]) {}
}

/// Narrator that writes a placeholder track.
pub struct SilentNarrator;

#[async_trait]
impl NarrationSynthesizer for SilentNarrator {
    async fn synthesize(&self, _text: &str, output: &Path) -> MediaResult<()> {
        std::fs::write(output, b"mp3")?;
        Ok(())
    }
}
