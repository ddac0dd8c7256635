//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use reel_media::{AssetCatalog, CommandNarrator, FfmpegTranscoder};
use reel_worker::{JobExecutor, RenderConfig, RenderPipeline, RenderServices};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub executor: Arc<JobExecutor>,
}

impl AppState {
    /// Create the production state: FFmpeg transcoder, command narrator and
    /// the asset directory from the render config.
    pub fn new(config: ApiConfig, render: RenderConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&render.output_dir)?;
        std::fs::create_dir_all(&render.temp_dir)?;

        let assets = render
            .assets_dir
            .clone()
            .map(AssetCatalog::new)
            .unwrap_or_default();
        let missing = assets.missing_required();
        if !missing.is_empty() {
            warn!(
                dir = %assets.dir().display(),
                "Missing assets, some modes will fail: {}",
                missing.join(", ")
            );
        }
        info!("Using assets from {}", assets.dir().display());

        let transcoder = FfmpegTranscoder::new().with_timeout(render.stage_timeout.as_secs());
        let narrator = CommandNarrator::from_command_line(&render.narration_command, render.narration_timeout)?;

        let services = RenderServices {
            transcoder: Arc::new(transcoder),
            narrator: Arc::new(narrator),
            text: None,
            assets,
        };
        let executor = JobExecutor::new(RenderPipeline::new(services, render));

        Ok(Self::with_executor(config, executor))
    }

    /// State around an already built executor.
    pub fn with_executor(config: ApiConfig, executor: JobExecutor) -> Self {
        Self {
            config,
            executor: Arc::new(executor),
        }
    }

    pub fn render_config(&self) -> &RenderConfig {
        self.executor.pipeline().config()
    }
}
