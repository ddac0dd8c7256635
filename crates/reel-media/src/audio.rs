//! Attach an audio track to a finished video.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use reel_models::encoding::AUDIO_VOLUME;
use reel_models::EncodingConfig;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::volume_filter;
use crate::transcoder::Transcoder;

/// How the audio source is stretched over the video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioBinding {
    /// Loop forever and cut the output at `duration_secs`
    LoopUnbounded { duration_secs: f64 },
    /// Repeat the source `loops` extra times and stop at the shorter stream
    ExactLoops { loops: u32 },
    /// Play once; the video was timed to the track
    Narration { duration_secs: f64 },
}

/// Extra repetitions needed for `audio_secs` of audio to cover `video_secs`.
pub fn loop_count(video_secs: f64, audio_secs: f64) -> MediaResult<u32> {
    if !audio_secs.is_finite() || audio_secs <= 0.0 {
        return Err(MediaError::InvalidAudio(format!(
            "Audio duration must be positive, got {}",
            audio_secs
        )));
    }
    let loops = (video_secs / audio_secs).ceil() - 1.0;
    Ok(loops.max(0.0) as u32)
}

pub fn bind_command(
    video: &Path,
    audio: &Path,
    output: &Path,
    binding: AudioBinding,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(video, output).add_input(audio);
    let cmd = match binding {
        AudioBinding::LoopUnbounded { .. } => cmd.stream_loop(-1),
        AudioBinding::ExactLoops { loops } => cmd.stream_loop(loops as i64),
        AudioBinding::Narration { .. } => cmd,
    };

    let cmd = cmd
        .map("0:v:0")
        .map("1:a:0")
        .output_args(["-c:v", "copy"])
        .audio_codec(&encoding.audio_codec)
        .audio_filter(volume_filter(AUDIO_VOLUME));

    match binding {
        AudioBinding::LoopUnbounded { duration_secs } | AudioBinding::Narration { duration_secs } => {
            cmd.output_duration(duration_secs).expected_duration(duration_secs)
        }
        AudioBinding::ExactLoops { .. } => cmd.shortest(),
    }
}

/// Binds audio tracks through a [`Transcoder`].
#[derive(Clone)]
pub struct AudioBinder {
    transcoder: Arc<dyn Transcoder>,
    encoding: EncodingConfig,
}

impl AudioBinder {
    pub fn new(transcoder: Arc<dyn Transcoder>, encoding: EncodingConfig) -> Self {
        Self {
            transcoder,
            encoding,
        }
    }

    pub async fn bind(&self, video: &Path, audio: &Path, output: &Path, binding: AudioBinding) -> MediaResult<()> {
        info!(
            video = %video.display(),
            audio = %audio.display(),
            ?binding,
            "Binding audio"
        );
        let cmd = bind_command(video, audio, output, binding, &self.encoding);
        self.transcoder.execute(&cmd).await
    }

    /// Probe both files and loop the audio just enough to cover the video.
    pub async fn bind_exact(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        let video_secs = self.transcoder.probe(video).await?.duration;
        let audio_secs = self.transcoder.probe(audio).await?.audio_duration()?;
        let loops = loop_count(video_secs, audio_secs)?;
        self.bind(video, audio, output, AudioBinding::ExactLoops { loops })
            .await
    }
}
