//! Background removal of old artifacts and orphaned job workspaces.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use metrics::counter;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::config::SweepConfig;
use crate::executor::JobExecutor;
use crate::workspace::JobWorkspace;

/// Deletes entries older than the configured age from a set of directories.
///
/// Workspaces of jobs still running on the attached executor are kept.
pub struct TempSweeper {
    roots: Vec<PathBuf>,
    config: SweepConfig,
    executor: Option<Arc<JobExecutor>>,
}

impl TempSweeper {
    pub fn new(roots: Vec<PathBuf>, config: SweepConfig) -> Self {
        Self {
            roots,
            config,
            executor: None,
        }
    }

    pub fn with_executor(mut self, executor: Arc<JobExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Start the background sweep loop.
    ///
    /// Runs indefinitely; spawn it as a background task.
    pub async fn run(&self) {
        if !self.config.enabled {
            info!("Temp sweeping is disabled");
            return;
        }

        info!(
            "Starting temp sweeper (interval: {:?}, max age: {:?})",
            self.config.interval, self.config.max_age
        );

        let mut ticker = interval(self.config.interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep_once().await {
                error!("Temp sweep error: {}", e);
            }
        }
    }

    /// Run a single sweep over every root.
    pub async fn sweep_once(&self) -> anyhow::Result<usize> {
        let roots = self.roots.clone();
        let max_age = self.config.max_age;
        let busy: Vec<String> = self
            .executor
            .iter()
            .flat_map(|executor| executor.in_flight_ids())
            .map(|id| JobWorkspace::prefix(&id))
            .collect();

        let removed = tokio::task::spawn_blocking(move || {
            let now = SystemTime::now();
            roots
                .iter()
                .map(|root| sweep_root(root, max_age, now, &busy))
                .sum::<usize>()
        })
        .await?;

        if removed > 0 {
            info!("Temp sweep removed {} entries", removed);
        }
        Ok(removed)
    }
}

/// Remove direct children of `root` last modified more than `max_age` before `now`.
///
/// Entries whose name starts with one of `busy` are left alone.
pub fn sweep_root(root: &Path, max_age: Duration, now: SystemTime, busy: &[String]) -> usize {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), "Skipping sweep root: {}", e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if busy.iter().any(|prefix| name.starts_with(prefix.as_str())) {
            debug!(path = %path.display(), "Skipping workspace of running job");
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= max_age {
            continue;
        }

        let result = if metadata.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match result {
            Ok(()) => {
                removed += 1;
                counter!("reel_swept_entries_total").increment(1);
                debug!(path = %path.display(), age_secs = age.as_secs(), "Swept old entry");
            }
            Err(e) => warn!(path = %path.display(), "Failed to sweep entry: {}", e),
        }
    }

    removed
}
