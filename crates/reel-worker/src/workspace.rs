//! Per-job scratch directories.

use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use tracing::debug;

use reel_models::JobId;

use crate::error::WorkerResult;

const UPLOADS_DIR: &str = "uploads";

/// Exclusive scratch directory for one job, removed on drop.
///
/// Uploads, frames, clips, concat lists and merge intermediates all live
/// here, so concurrent jobs never share a file name.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
}

impl JobWorkspace {
    /// Create `job-{id}-XXXX` under `root`, plus an uploads directory.
    pub fn create(root: &Path, job_id: &JobId) -> WorkerResult<Self> {
        std::fs::create_dir_all(root)?;
        let dir = Builder::new().prefix(&Self::prefix(job_id)).tempdir_in(root)?;
        std::fs::create_dir(dir.path().join(UPLOADS_DIR))?;
        debug!("Created job workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Directory name prefix shared by every workspace of `job_id`.
    pub fn prefix(job_id: &JobId) -> String {
        format!("job-{}-", job_id.short())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.dir.path().join(UPLOADS_DIR)
    }

    /// Path of an uploaded file; `index` keeps same-named uploads apart.
    pub fn upload_path(&self, index: usize, extension: &str) -> PathBuf {
        self.uploads_dir().join(format!("{index:03}.{extension}"))
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("frame_{index:03}.png"))
    }

    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("clip_{index:03}.mp4"))
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
