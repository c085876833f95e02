use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segmenta_core::{
    load_config_or_default, select_strategy, validate_config, ConversionPipeline,
    EncoderCapabilities, FfprobeProber, MediaProber,
};
use segmenta_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SEGMENTA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; a missing file means defaults plus env overrides
    info!("Loading configuration from {:?}", config_path);
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    info!("Output root: {:?}", config.storage.output_root);
    info!("Staging root: {:?}", config.storage.staging_root);

    config
        .storage
        .ensure_directories()
        .await
        .context("Failed to create storage directories")?;

    // Pick the transcoding strategy for this host
    let capabilities = EncoderCapabilities::detect(&config.transcoder).await;
    info!(
        nvenc = capabilities.has_nvenc(),
        hardware = capabilities.has_hardware_encoder(),
        "Encoder capabilities detected"
    );

    let prober: Arc<dyn MediaProber> = Arc::new(FfprobeProber::from_config(&config.transcoder));
    let strategy = select_strategy(&config.transcoder, &capabilities, Arc::clone(&prober)).await;
    let pipeline = Arc::new(ConversionPipeline::new(&config, strategy, prober));
    info!(strategy = pipeline.strategy_name(), "Conversion pipeline ready");

    let state = Arc::new(AppState::new(config.clone(), pipeline, capabilities));

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&state)))
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM), then cancel running jobs
/// so their upload requests can finish.
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Server shutting down...");
    let tracker = state.tracker();
    for job in tracker.list() {
        if tracker.cancel(&job.id) {
            warn!(job_id = %job.id, "Cancelling job for shutdown");
        }
    }
}
