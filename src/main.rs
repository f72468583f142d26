//! Todo Sync API server
//!
//! Serves the todo Resource API over HTTP.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: connection pool size (default: 5)
//! - `RUST_LOG`: Logging level (default: `todo_sync=debug,tower_http=debug`)
//! - `LOG_FORMAT`: `json` for JSON log lines, anything else for human-readable output
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `5000`)
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use todo_sync::api::{AppState, create_router};
use todo_sync::infrastructure::{RepositoryConfig, RepositoryFactory};

const DEFAULT_LOG_FILTER: &str = "todo_sync=debug,tower_http=debug";
const DEFAULT_PORT: u16 = 5000;

/// Result of parsing the `WORKER_THREADS` environment variable.
#[derive(Debug, PartialEq, Eq)]
struct WorkerThreadsResult {
    threads: Option<usize>,
    warning: Option<String>,
}

/// Interprets a `WORKER_THREADS` value against the number of logical CPUs.
///
/// Zero and unparsable values fall back to the runtime default; values above
/// four threads per CPU are capped.
fn parse_worker_threads(value: Option<&str>, available: usize) -> WorkerThreadsResult {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return WorkerThreadsResult {
            threads: None,
            warning: None,
        };
    }

    match trimmed.parse::<usize>() {
        Ok(0) => WorkerThreadsResult {
            threads: None,
            warning: Some("WORKER_THREADS=0 is invalid (must be > 0), using default".to_string()),
        },
        Ok(requested) => {
            let max_threads = available.saturating_mul(4);
            if requested > max_threads {
                WorkerThreadsResult {
                    threads: Some(max_threads),
                    warning: Some(format!(
                        "WORKER_THREADS={requested} exceeds recommended limit ({max_threads}), capping to {max_threads}"
                    )),
                }
            } else {
                WorkerThreadsResult {
                    threads: Some(requested),
                    warning: None,
                }
            }
        }
        Err(error) => WorkerThreadsResult {
            threads: None,
            warning: Some(format!(
                "WORKER_THREADS='{trimmed}' is not a valid number ({error}), using default"
            )),
        },
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let available = std::thread::available_parallelism().map_or(16, std::num::NonZeroUsize::get);
    let worker_threads = parse_worker_threads(env::var("WORKER_THREADS").ok().as_deref(), available);

    if let Some(warning) = &worker_threads.warning {
        eprintln!("Warning: {warning}");
    }

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = worker_threads.threads {
        builder.worker_threads(threads);
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to create tokio runtime: {error}");
            std::process::exit(1);
        }
    };
    runtime.block_on(async_main(worker_threads.threads));
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json_output = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json_output {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn async_main(worker_threads: Option<usize>) {
    init_tracing();

    tracing::info!(?worker_threads, "Starting todo-sync API server");

    let config = match RepositoryConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?config.storage_mode,
        max_connections = config.max_connections,
        "Repository configuration loaded"
    );

    let factory = RepositoryFactory::new(config);
    let repository = match factory.create().await {
        Ok(repository) => {
            tracing::info!("Record store initialized successfully");
            repository
        }
        Err(error) => {
            tracing::error!("Failed to initialize record store: {}", error);
            std::process::exit(1);
        }
    };

    let application = create_router(AppState::new(repository));

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|port| port.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let address: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address: {}:{}", host, port);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
