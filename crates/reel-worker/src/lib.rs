//! Render worker.
//!
//! This crate provides:
//! - The render pipeline for the five render modes
//! - Job admission, cancellation and metrics
//! - Per-job scratch workspaces
//! - Sweeping of old artifacts and workspaces

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;
pub mod sweeper;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{RenderConfig, SweepConfig};
pub use error::{ValidationError, WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use pipeline::{plan, precheck, RenderOutcome, RenderPipeline, RenderPlan, RenderServices};
pub use sweeper::TempSweeper;
pub use workspace::JobWorkspace;
