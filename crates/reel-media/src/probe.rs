//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use reel_models::Orientation;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// What the pipeline needs to know about an input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width of the first video stream, 0 for audio-only files
    pub width: u32,
    /// Height of the first video stream, 0 for audio-only files
    pub height: u32,
    /// Codec of the first video stream
    pub codec: Option<String>,
    pub has_video: bool,
    pub has_audio: bool,
}

impl MediaInfo {
    /// Orientation of the video stream.
    pub fn orientation(&self) -> MediaResult<Orientation> {
        if !self.has_video || self.width == 0 || self.height == 0 {
            return Err(MediaError::InvalidVideo("No video stream found".to_string()));
        }
        Ok(Orientation::from_dimensions(self.width, self.height))
    }

    /// Duration of an audio source, rejecting empty or unreadable tracks.
    pub fn audio_duration(&self) -> MediaResult<f64> {
        if !self.has_audio {
            return Err(MediaError::InvalidAudio("No audio stream found".to_string()));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(MediaError::InvalidAudio(format!(
                "Audio duration must be positive, got {}",
                self.duration
            )));
        }
        Ok(self.duration)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Probe a media file.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let ffprobe = check_ffprobe()?;

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe failed for {}", path.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_probe_output(&output.stdout)
}

/// Parse `ffprobe -print_format json` output.
pub fn parse_probe_output(json: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let video = probe.streams.iter().find(|s| s.codec_type == "video");
    let audio = probe.streams.iter().find(|s| s.codec_type == "audio");

    // Container duration first, then the first stream that reports one
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            video
                .or(audio)
                .and_then(|s| s.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    if video.is_none() && audio.is_none() {
        return Err(MediaError::InvalidVideo("No audio or video stream found".to_string()));
    }

    Ok(MediaInfo {
        duration,
        width: video.and_then(|s| s.width).unwrap_or(0),
        height: video.and_then(|s| s.height).unwrap_or(0),
        codec: video.and_then(|s| s.codec_name.clone()),
        has_video: video.is_some(),
        has_audio: audio.is_some(),
    })
}
