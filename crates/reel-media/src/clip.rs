//! Still-frame clips and per-clip video transforms.
//!
//! Each operation is a single FFmpeg invocation. The command builders are
//! free functions so the exact arguments can be checked without a process.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use reel_models::{EncodingConfig, Resolution};

use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filters::{frame_clip_graph, normalize_graph, transform_graph, BannerInputs, TRANSFORM_OUTPUT};
use crate::transcoder::Transcoder;

/// Turn a composed frame into a silent clip with fades.
pub fn frame_clip_command(
    frame: &Path,
    output: &Path,
    res: Resolution,
    duration: f64,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(frame, output)
        .loop_image()
        .input_duration(duration)
        .video_filter(frame_clip_graph(res, duration).render())
        .frame_rate(encoding.frame_rate)
        .video_codec(&encoding.codec)
        .pixel_format(&encoding.pixel_format)
        .no_audio()
        .expected_duration(duration)
}

/// Fit a clip on brand background and overlay whichever banners exist.
pub fn transform_command(
    input: &Path,
    output: &Path,
    res: Resolution,
    bottom_banner: Option<&Path>,
    top_banner: Option<&Path>,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(input, output);
    let mut banners = BannerInputs::default();
    let mut next_index = 1;

    if let Some(path) = bottom_banner {
        cmd = cmd.add_input(path);
        banners.bottom = Some(next_index);
        next_index += 1;
    }
    if let Some(path) = top_banner {
        cmd = cmd.add_input(path);
        banners.top = Some(next_index);
    }

    cmd.filter_complex(transform_graph(res, banners).render())
        .map(format!("[{TRANSFORM_OUTPUT}]"))
        .map("0:a?")
        .video_codec(&encoding.codec)
        .audio_codec(&encoding.audio_codec)
        .pixel_format(&encoding.pixel_format)
        .shortest()
}

/// Re-encode a clip that already matches the requested orientation.
pub fn normalize_command(
    input: &Path,
    output: &Path,
    res: Resolution,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .video_filter(normalize_graph(res).render())
        .video_codec(&encoding.codec)
        .audio_codec(&encoding.audio_codec)
        .pixel_format(&encoding.pixel_format)
        .preset(&encoding.preset)
}

/// Runs clip-level encodes through a [`Transcoder`].
#[derive(Clone)]
pub struct ClipSynthesizer {
    transcoder: Arc<dyn Transcoder>,
    encoding: EncodingConfig,
}

impl ClipSynthesizer {
    pub fn new(transcoder: Arc<dyn Transcoder>, encoding: EncodingConfig) -> Self {
        Self {
            transcoder,
            encoding,
        }
    }

    pub async fn frame_to_clip(
        &self,
        frame: &Path,
        output: &Path,
        res: Resolution,
        duration: f64,
    ) -> MediaResult<()> {
        let cmd = frame_clip_command(frame, output, res, duration, &self.encoding);
        self.transcoder.execute(&cmd).await
    }

    pub async fn transform_clip(
        &self,
        input: &Path,
        output: &Path,
        res: Resolution,
        bottom_banner: Option<&Path>,
        top_banner: Option<&Path>,
    ) -> MediaResult<()> {
        info!(
            input = %input.display(),
            bottom_banner = bottom_banner.is_some(),
            top_banner = top_banner.is_some(),
            "Transforming clip"
        );
        let cmd = transform_command(input, output, res, bottom_banner, top_banner, &self.encoding);
        self.transcoder.execute(&cmd).await
    }

    pub async fn normalize_clip(&self, input: &Path, output: &Path, res: Resolution) -> MediaResult<()> {
        info!(input = %input.display(), "Normalizing clip");
        let cmd = normalize_command(input, output, res, &self.encoding);
        self.transcoder.execute(&cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTranscoder;
    use std::path::PathBuf;

    fn args(cmd: &FfmpegCommand) -> String {
        cmd.build_args().join(" ")
    }

    #[test]
    fn test_frame_clip_command() {
        let cmd = frame_clip_command(
            Path::new("/w/frame_000.png"),
            Path::new("/w/clip_000.mp4"),
            Resolution::PORTRAIT,
            6.0,
            &EncodingConfig::default(),
        );
        let line = args(&cmd);

        assert!(line.contains("-loop 1 -t 6.000 -i /w/frame_000.png"));
        assert!(line.contains(
            "-vf scale=1080:1920,format=yuv420p,fade=t=in:st=0:d=0.25,fade=t=out:st=5.75:d=0.25"
        ));
        assert!(line.ends_with("-r 30 -c:v libx264 -pix_fmt yuv420p -an /w/clip_000.mp4"));
    }

    #[test]
    fn test_transform_command_with_both_banners() {
        let cmd = transform_command(
            Path::new("/w/in.mp4"),
            Path::new("/w/out.mp4"),
            Resolution::PORTRAIT,
            Some(Path::new("/a/bottom.png")),
            Some(Path::new("/a/top.png")),
            &EncodingConfig::default(),
        );
        let sources: Vec<_> = cmd.inputs().iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["/w/in.mp4", "/a/bottom.png", "/a/top.png"]);

        let line = args(&cmd);
        assert!(line.contains("[1:v]scale=1080:640[bottombanner]"));
        assert!(line.contains("[2:v]scale=1080:640[topbanner]"));
        assert!(line.contains("-map [finalv] -map 0:a? -c:v libx264 -c:a aac -pix_fmt yuv420p -shortest"));
    }

    #[test]
    fn test_transform_command_missing_bottom_banner() {
        let cmd = transform_command(
            Path::new("/w/in.mp4"),
            Path::new("/w/out.mp4"),
            Resolution::LANDSCAPE,
            None,
            Some(Path::new("/a/top.png")),
            &EncodingConfig::default(),
        );
        let line = args(&cmd);

        assert_eq!(cmd.inputs().len(), 2);
        assert!(line.contains("[1:v]scale=1920:360[topbanner]"));
        assert!(!line.contains("bottombanner"));
    }

    #[test]
    fn test_normalize_command() {
        let cmd = normalize_command(
            Path::new("/w/in.mp4"),
            Path::new("/w/out.mp4"),
            Resolution::PORTRAIT,
            &EncodingConfig::default(),
        );
        assert!(args(&cmd).contains(
            "-vf scale=1080:1920,setsar=1 -c:v libx264 -c:a aac -pix_fmt yuv420p -preset fast"
        ));
    }

    #[tokio::test]
    async fn test_synthesizer_runs_through_transcoder() {
        let dir = tempfile::TempDir::new().unwrap();
        let fake = Arc::new(RecordingTranscoder::new());
        let synth = ClipSynthesizer::new(fake.clone(), EncodingConfig::default());
        let out: PathBuf = dir.path().join("clip.mp4");

        synth
            .frame_to_clip(Path::new("frame.png"), &out, Resolution::LANDSCAPE, 6.0)
            .await
            .unwrap();

        assert!(out.exists());
        assert_eq!(fake.commands().len(), 1);
    }
}
