//! Render and sweep configuration.

use std::path::PathBuf;
use std::time::Duration;

use reel_media::layout::PortraitStyle;
use reel_media::narration::{DEFAULT_NARRATION_COMMAND, DEFAULT_NARRATION_TIMEOUT_SECS};
use reel_models::EncodingConfig;

/// Render pipeline configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Directory holding finished artifacts
    pub output_dir: PathBuf,
    /// Root under which per-job workspaces are created
    pub temp_dir: PathBuf,
    /// Asset directory override; resolved automatically when unset
    pub assets_dir: Option<PathBuf>,
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Maximum files per upload
    pub max_files: usize,
    /// Kill any single external process after this long
    pub stage_timeout: Duration,
    /// How long a request may wait for a job slot
    pub admission_timeout: Duration,
    /// Segments composed and encoded at once within a job
    pub frame_parallelism: usize,
    pub portrait_layout: PortraitStyle,
    /// Watermark line for the full-bleed portrait layout
    pub watermark_text: Option<String>,
    pub narration_command: String,
    pub narration_timeout: Duration,
    pub encoding: EncodingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            temp_dir: std::env::temp_dir().join("reelforge"),
            assets_dir: None,
            max_concurrent_jobs: 2,
            max_files: 20,
            stage_timeout: Duration::from_secs(900),
            admission_timeout: Duration::from_secs(30),
            frame_parallelism: 1,
            portrait_layout: PortraitStyle::ThreeBand,
            watermark_text: None,
            narration_command: DEFAULT_NARRATION_COMMAND.to_string(),
            narration_timeout: Duration::from_secs(DEFAULT_NARRATION_TIMEOUT_SECS),
            encoding: EncodingConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            output_dir: std::env::var("RENDER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            temp_dir: std::env::var("RENDER_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            assets_dir: std::env::var("RENDER_ASSETS_DIR").ok().map(PathBuf::from),
            max_concurrent_jobs: std::env::var("RENDER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            max_files: std::env::var("RENDER_MAX_FILES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_files),
            stage_timeout: Duration::from_secs(
                std::env::var("RENDER_STAGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            admission_timeout: Duration::from_secs(
                std::env::var("RENDER_ADMISSION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            frame_parallelism: std::env::var("RENDER_FRAME_PARALLELISM")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.frame_parallelism),
            portrait_layout: std::env::var("RENDER_PORTRAIT_LAYOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            watermark_text: std::env::var("RENDER_WATERMARK_TEXT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            narration_command: std::env::var("NARRATION_COMMAND")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.narration_command),
            narration_timeout: Duration::from_secs(
                std::env::var("NARRATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_NARRATION_TIMEOUT_SECS),
            ),
            encoding: defaults.encoding,
        }
    }
}

/// Temp and output sweeping configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub enabled: bool,
    pub interval: Duration,
    /// Entries older than this are deleted
    pub max_age: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(600),
            max_age: Duration::from_secs(7200), // 2 hours
        }
    }
}

impl SweepConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SWEEP_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            interval: Duration::from_secs(
                std::env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            max_age: Duration::from_secs(
                std::env::var("SWEEP_MAX_AGE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(7200),
            ),
        }
    }
}
