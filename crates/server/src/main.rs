use anyhow::{Context, Error as AnyhowError};
use db::DBService;
use server::{
    AppState,
    config::{ConfigError, PortalConfig},
    file_logging, routes,
};
use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), PortalError> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    // The guard must live until exit so buffered file logs are flushed
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _file_log_guard = file_logging::init_logging(&log_level);

    let config = PortalConfig::from_env()?;
    let db = DBService::new().await?;

    let host = config.host.clone();
    let port = config.port;
    let app_router = routes::router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("Server running on http://{host}:{actual_port}");

    axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush the WAL only after the last request has finished
    db.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }

    tracing::info!("Shutdown signal received, draining connections");
}
