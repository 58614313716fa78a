//! claimbeaver-server: healthcare claims inquiry HTTP server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use claimbeaver_server::agent::InquiryAgent;
use claimbeaver_server::config::Config;
use claimbeaver_server::db::{self, PgDatabase, ResultFormat};
use claimbeaver_server::llm::{ChatModel, LlmProvider};

#[tokio::main]
async fn main() {
    // Pick up a local .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    // Load configuration
    let config = Config::from_env();

    // Create database pool
    let pool = db::create_pool(&config.database_url).expect("Failed to create database pool");
    let database = PgDatabase::new(pool, config.database_schema.clone())
        .with_sample_rows(config.sample_rows)
        .with_result_format(ResultFormat {
            max_rows: config.result_max_rows,
            max_cell_chars: config.result_max_cell_chars,
        });

    // Select the LLM backend (falls back to the other one, then to a stub)
    let llm = LlmProvider::initialize(&config.llm);
    if llm.is_available() {
        tracing::info!(backend = llm.name(), "LLM backend ready");
    } else {
        tracing::warn!("No LLM backend available, /ask will return an unavailability notice");
    }

    let agent = InquiryAgent::new(Arc::new(llm), Arc::new(database));

    // Build application
    let app = claimbeaver_server::build_app(agent, &config);

    // Start server
    let addr: SocketAddr = config.bind_address.parse().expect("Invalid bind address");
    tracing::info!("Starting ClaimBeaver server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server shutdown complete");
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
