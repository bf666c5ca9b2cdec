//! Main entry point for the health check server binary

use anyhow::Result;
use axum::{routing::get, Json, Router};
use hcheck::{
    new_handler_with_middleware, no_store_layer, run_server, with_tracing, AppConfig,
    FilesystemCheck, HealthEndpoint, Registry,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());
    info!(
        "Health endpoint: {} (timeout {:?})",
        config.health.path(),
        config.health.timeout()
    );

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let registry = Registry::new().with_test(
        "filesystem",
        FilesystemCheck::new([std::env::temp_dir()]),
    )?;

    let endpoint = HealthEndpoint::new(registry, config.health.clone())?;
    let app = with_tracing(new_handler_with_middleware(
        application(),
        endpoint,
        vec![no_store_layer()],
    ));

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn application() -> Router {
    Router::new().route(
        "/",
        get(|| async {
            Json(serde_json::json!({
                "app": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }))
        }),
    )
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        format!(
            "{}={},hcheck={},tower_http=debug",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
