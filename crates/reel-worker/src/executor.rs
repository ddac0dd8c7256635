//! Job executor.
//!
//! Bounds how many renders run at once and keeps a cancel handle for every
//! job in flight. A job runs inside the caller's future: if the caller goes
//! away, the pipeline future is dropped, its FFmpeg child is killed and its
//! workspace deleted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use tokio::sync::{watch, Semaphore};
use tracing::{info, warn};

use reel_models::{JobId, RenderJob};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::pipeline::{precheck, RenderOutcome, RenderPipeline};
use crate::workspace::JobWorkspace;

type CancelRegistry = Arc<Mutex<HashMap<JobId, watch::Sender<bool>>>>;

/// Runs render jobs with admission control.
pub struct JobExecutor {
    pipeline: Arc<RenderPipeline>,
    job_semaphore: Arc<Semaphore>,
    max_concurrent_jobs: usize,
    admission_timeout: Duration,
    in_flight: CancelRegistry,
}

impl JobExecutor {
    /// Create a new job executor sized from the pipeline's config.
    pub fn new(pipeline: RenderPipeline) -> Self {
        let max_concurrent_jobs = pipeline.config().max_concurrent_jobs.max(1);
        let admission_timeout = pipeline.config().admission_timeout;

        Self {
            pipeline: Arc::new(pipeline),
            job_semaphore: Arc::new(Semaphore::new(max_concurrent_jobs)),
            max_concurrent_jobs,
            admission_timeout,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    /// Render a job, waiting at most the admission timeout for a free slot.
    ///
    /// Requests that fail [`precheck`] are rejected before admission.
    pub async fn submit(&self, job: RenderJob, workspace: JobWorkspace) -> WorkerResult<RenderOutcome> {
        let mode = job.mode.as_str();

        if let Err(e) = precheck(&job) {
            counter!("reel_jobs_failed_total", "mode" => mode, "kind" => "validation").increment(1);
            warn!(job_id = %job.id, mode, "Rejected job: {}", e);
            return Err(e.into());
        }

        let permit = match tokio::time::timeout(
            self.admission_timeout,
            Arc::clone(&self.job_semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(WorkerError::busy("Executor is shutting down")),
            Err(_) => {
                counter!("reel_jobs_rejected_total", "mode" => mode).increment(1);
                warn!(
                    job_id = %job.id,
                    mode,
                    "No render slot became free within {:?}",
                    self.admission_timeout
                );
                return Err(WorkerError::busy(format!(
                    "All {} render slots are busy",
                    self.max_concurrent_jobs
                )));
            }
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let _registration = InFlight::register(&self.in_flight, &job.id, cancel_tx);

        let logger = JobLogger::new(&job.id, job.mode);
        counter!("reel_jobs_started_total", "mode" => mode).increment(1);
        info!(job_id = %job.id, mode, "Executing job");
        let started = Instant::now();

        let result = tokio::select! {
            result = self.pipeline.run(job, workspace) => result,
            _ = wait_for_cancel(cancel_rx) => Err(WorkerError::Cancelled),
        };
        drop(permit);

        histogram!("reel_job_duration_seconds", "mode" => mode).record(started.elapsed().as_secs_f64());
        match &result {
            Ok(_) => counter!("reel_jobs_completed_total", "mode" => mode).increment(1),
            Err(e) => {
                counter!("reel_jobs_failed_total", "mode" => mode, "kind" => e.kind()).increment(1);
                // Validation failures were already reported by the pipeline.
                if e.validation().is_none() {
                    logger.log_error(&e.to_string());
                }
            }
        }

        result
    }

    /// Cancel one in-flight job. Returns false when it is not running.
    pub fn cancel(&self, job_id: &JobId) -> bool {
        match lock(&self.in_flight).get(job_id) {
            Some(tx) => {
                info!(job_id = %job_id, "Cancelling job");
                tx.send(true).is_ok()
            }
            None => false,
        }
    }

    /// Cancel every in-flight job, returning how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let registry = lock(&self.in_flight);
        registry.values().filter(|tx| tx.send(true).is_ok()).count()
    }

    /// Refuse new jobs and cancel the running ones.
    pub fn shutdown(&self) -> usize {
        self.job_semaphore.close();
        let cancelled = self.cancel_all();
        info!("Job executor shut down, {} in-flight jobs cancelled", cancelled);
        cancelled
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// IDs of the jobs currently holding a render slot.
    pub fn in_flight_ids(&self) -> Vec<JobId> {
        lock(&self.in_flight).keys().cloned().collect()
    }

    pub fn available_slots(&self) -> usize {
        self.job_semaphore.available_permits()
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs
    }
}

fn lock(registry: &CancelRegistry) -> MutexGuard<'_, HashMap<JobId, watch::Sender<bool>>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Resolves once the flag flips to true. A dropped sender never resolves.
async fn wait_for_cancel(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Registry entry removed when the job finishes, fails or is dropped.
struct InFlight {
    registry: CancelRegistry,
    job_id: JobId,
}

impl InFlight {
    fn register(registry: &CancelRegistry, job_id: &JobId, cancel: watch::Sender<bool>) -> Self {
        let count = {
            let mut map = lock(registry);
            map.insert(job_id.clone(), cancel);
            map.len()
        };
        gauge!("reel_jobs_in_flight").set(count as f64);

        Self {
            registry: Arc::clone(registry),
            job_id: job_id.clone(),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let count = {
            let mut map = lock(&self.registry);
            map.remove(&self.job_id);
            map.len()
        };
        gauge!("reel_jobs_in_flight").set(count as f64);
    }
}
