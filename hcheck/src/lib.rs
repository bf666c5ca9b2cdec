//! Pluggable health check endpoint for axum applications.
//!
//! Register named tests in a [`Registry`], freeze it into a [`HealthEndpoint`]
//! and mount it in front of an application router with [`new_handler`]. Every
//! request to the health path runs all tests concurrently under one deadline
//! and answers with a JSON report: 200 when the system is available or
//! degraded, 503 when it is unavailable or the deadline fired.

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod mount;

pub use crate::config::{AppConfig, HealthConfig, ServerConfig};
pub use error::{HcheckError, Result, TestError};
pub use handlers::HealthEndpoint;
pub use health::{
    CheckContext, Evaluation, FilesystemCheck, HealthCheck, Registry, Status, TestFunc,
    TestOutcome, TestResult,
};
pub use middleware::{no_store_layer, with_tracing, MiddlewareFn};
pub use mount::{new_handler, new_handler_with_middleware};

use axum::Router;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
