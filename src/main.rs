//! Policy Engine
//!
//! Batch ingestion and scheduling backend handling:
//! - CSV/XLSX uploads resolved into a policy entity graph
//! - scheduled message delivery with a strict status state machine
//! - a CPU watchdog that requests a process restart under sustained load

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};

use api::{router, AppState};
use doc_store::{DocumentStore, MemoryStore};
use telemetry::{health, init_tracing_from_env};
use worker::{BackgroundWorkers, WorkerConfig};

/// Exit code that tells the supervisor to restart the process.
const RESTART_EXIT_CODE: i32 = 86;

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_upload_dir")]
    upload_dir: String,
    #[serde(default = "default_worker_timeout_secs")]
    worker_timeout_secs: u64,
    #[serde(default = "default_message_check_interval_secs")]
    message_check_interval_secs: u64,
    #[serde(default = "default_cpu_threshold_percent")]
    cpu_threshold_percent: f32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_worker_timeout_secs() -> u64 {
    policy_core::limits::WORKER_TIMEOUT_SECS
}

fn default_message_check_interval_secs() -> u64 {
    policy_core::limits::MESSAGE_CHECK_INTERVAL_SECS
}

fn default_cpu_threshold_percent() -> f32 {
    policy_core::limits::CPU_THRESHOLD_PERCENT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upload_dir: default_upload_dir(),
            worker_timeout_secs: default_worker_timeout_secs(),
            message_check_interval_secs: default_message_check_interval_secs(),
            cpu_threshold_percent: default_cpu_threshold_percent(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting Policy Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    // Initialize the document store
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::default());
    health().store.set_healthy();
    info!("Document store: healthy");

    // Restart coordination: the watchdog fires once, the server drains,
    // the process exits with the restart code for the supervisor.
    let restart_requested = Arc::new(AtomicBool::new(false));
    let restart_notify = Arc::new(Notify::new());

    // Start background workers (message processor + CPU watchdog)
    let worker_config = WorkerConfig {
        message_check_interval: Duration::from_secs(config.message_check_interval_secs),
        cpu_threshold_percent: config.cpu_threshold_percent,
        ..WorkerConfig::default()
    };
    let workers = BackgroundWorkers::new(worker_config, store.clone());
    let _worker_handles = {
        let flag = restart_requested.clone();
        let notify = restart_notify.clone();
        workers.start(move || {
            flag.store(true, Ordering::SeqCst);
            notify.notify_one();
        })
    };

    // Create application state
    let state = AppState::new(store.clone(), PathBuf::from(&config.upload_dir))
        .with_worker_timeout(Duration::from_secs(config.worker_timeout_secs));

    // Create router
    let app = router(state);

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(restart_notify))
        .await
        .context("Server error")?;

    info!("Shutdown complete");

    if restart_requested.load(Ordering::SeqCst) {
        warn!(exit_code = RESTART_EXIT_CODE, "exiting for restart");
        std::process::exit(RESTART_EXIT_CODE);
    }
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("POLICY_ENGINE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Graceful shutdown signal handler. Resolves on Ctrl+C, SIGTERM, or a
/// watchdog restart request.
async fn shutdown_signal(restart: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
        _ = restart.notified() => info!("Watchdog requested restart, shutting down"),
    }
}
