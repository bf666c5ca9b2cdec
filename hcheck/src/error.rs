//! Error types for the health check engine and its HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HcheckError>;

#[derive(Error, Debug)]
pub enum HcheckError {
    #[error("Test already registered: {0}")]
    DuplicateTest(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for HcheckError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        tracing::error!("Health endpoint error: {}", self);

        let body = Json(json!({
            "error": "Internal server error",
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Errors the engine attaches to a test entry on the test's behalf.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestError {
    #[error("test took too long")]
    Timeout,

    #[error("test panicked: {0}")]
    Panicked(String),

    #[error("test exited without reporting")]
    NoReport,
}
