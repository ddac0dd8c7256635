//! Structured job logging utilities.

use std::time::{Duration, Instant};

use metrics::histogram;
use tracing::{error, info, warn, Span};

use reel_models::{JobId, RenderMode};

/// Job logger carrying the job id and render mode on every event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    mode: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, mode: RenderMode) -> Self {
        Self {
            job_id: job_id.to_string(),
            mode: mode.as_str().to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, mode = %self.mode, "Job started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, mode = %self.mode, "Job progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, mode = %self.mode, "Job warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, mode = %self.mode, "Job error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, mode = %self.mode, "Job completed: {}", message);
    }

    /// Start timing a named pipeline stage.
    pub fn stage(&self, name: &'static str) -> StageTimer {
        info!(job_id = %self.job_id, mode = %self.mode, stage = name, "Stage started");
        StageTimer {
            logger: self.clone(),
            name,
            started: Instant::now(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Span wrapping the whole job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, mode = %self.mode)
    }
}

/// Running stage; call [`StageTimer::finish`] when it succeeds.
#[derive(Debug)]
pub struct StageTimer {
    logger: JobLogger,
    name: &'static str,
    started: Instant,
}

impl StageTimer {
    /// Log and record the stage duration.
    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        histogram!("reel_stage_duration_seconds", "stage" => self.name, "mode" => self.logger.mode.clone())
            .record(elapsed.as_secs_f64());
        info!(
            job_id = %self.logger.job_id,
            mode = %self.logger.mode,
            stage = self.name,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stage finished"
        );
        elapsed
    }
}
