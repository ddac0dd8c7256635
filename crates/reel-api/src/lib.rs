//! Axum HTTP server.
//!
//! This crate provides:
//! - The upload form and result/error pages
//! - Artifact streaming
//! - Health, readiness and Prometheus metrics
//! - Security headers and request logging

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pages;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
