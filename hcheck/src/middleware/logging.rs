//! Request tracing for the mounted router

use axum::{extract::Request, response::Response, Router};
use http::StatusCode;
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::{info_span, Level, Span};

/// Wraps every route of `router`, the health endpoint included, in a request span.
pub fn with_tracing(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            })
            .on_request(|request: &Request, _span: &Span| {
                tracing::debug!("started {} {}", request.method(), request.uri().path());
            })
            .on_response(|response: &Response, latency: Duration, _span: &Span| {
                let status = response.status().as_u16();
                let latency_ms = latency.as_millis() as u64;

                let level = response_level(response.status());
                if level == Level::INFO {
                    tracing::info!(status, latency_ms, "request completed");
                } else if level == Level::WARN {
                    tracing::warn!(status, latency_ms, "client error response");
                } else {
                    tracing::error!(status, latency_ms, "server error response");
                }
            })
            .on_failure(
                |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                    tracing::debug!(
                        latency_ms = latency.as_millis() as u64,
                        error = ?error,
                        "request classified as failure"
                    );
                },
            ),
    )
}

/// A 503 from the health endpoint is a report, not a server fault.
fn response_level(status: StatusCode) -> Level {
    if status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE {
        Level::INFO
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::ERROR
    }
}
