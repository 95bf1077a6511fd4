//! Binding and serving the HTTP application.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::http::{build_router, AppState};
use crate::repository::SqliteReportRepository;
use crate::service::ReportService;

/// Build the application for `config`, opening its database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub fn build_app(config: &Config) -> Result<Router> {
    let database_path = config.database_path();
    let repository = SqliteReportRepository::open(&database_path)?;
    info!(path = %database_path.display(), "Opened report database");

    let service = ReportService::new(Arc::new(repository), config.server.max_content_length);
    Ok(build_router(AppState::new(service, config.server.clone())))
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let app = build_app(config)?;
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    run(listener, app, shutdown_signal()).await
}

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// Peer addresses are made available to handlers as
/// `ConnectInfo<SocketAddr>`.
///
/// # Errors
///
/// Returns an error if the listener fails.
pub async fn run<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Starting server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
