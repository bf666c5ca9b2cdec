//! Mounting the health endpoint in front of an existing application

use crate::{
    handlers::{handle_health, HealthEndpoint},
    middleware::MiddlewareFn,
};
use axum::{extract::Request, response::IntoResponse, routing::any, Router};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::info;

/// Serves `endpoint` at its configured path and forwards every other request
/// to `app` unchanged.
pub fn new_handler<S>(app: S, endpoint: HealthEndpoint) -> Router
where
    S: Service<Request, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    new_handler_with_middleware(app, endpoint, Vec::new())
}

/// Like [`new_handler`], with the health route passed through `middleware`
/// first. Only the health route is wrapped; `app` is left as it is.
pub fn new_handler_with_middleware<S, I>(app: S, endpoint: HealthEndpoint, middleware: I) -> Router
where
    S: Service<Request, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
    I: IntoIterator<Item = MiddlewareFn>,
{
    let path = endpoint.path();
    let tests = endpoint.registry().len();

    let mut health = any(handle_health).with_state(Arc::new(endpoint));
    for wrap in middleware {
        health = wrap(health);
    }

    info!("Mounted health endpoint at {} with {} tests", path, tests);

    Router::new().route(&path, health).fallback_service(app)
}
