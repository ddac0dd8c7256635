//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_api::{create_router, metrics, ApiConfig, AppState};
use reel_media::{check_ffmpeg, check_ffprobe};
use reel_worker::{JobExecutor, RenderConfig, SweepConfig, TempSweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reel-api");

    let config = ApiConfig::from_env();
    let render = RenderConfig::from_env();
    let sweep = SweepConfig::from_env();
    info!(
        "API config: host={}, port={}, max_jobs={}, output_dir={}, temp_dir={}",
        config.host,
        config.port,
        render.max_concurrent_jobs,
        render.output_dir.display(),
        render.temp_dir.display()
    );

    if let Err(e) = check_ffmpeg().and_then(|_| check_ffprobe()) {
        warn!("Media tools unavailable, renders will fail until installed: {}", e);
    }

    let sweep_roots = vec![render.output_dir.clone(), render.temp_dir.clone()];

    let state = match AppState::new(config.clone(), render) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let executor = Arc::clone(&state.executor);

    // Remove old artifacts and abandoned workspaces in the background
    let sweeper = TempSweeper::new(sweep_roots, sweep).with_executor(Arc::clone(&executor));
    tokio::spawn(async move {
        sweeper.run().await;
    });

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(executor))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(executor: Arc<JobExecutor>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
    executor.shutdown();
}
