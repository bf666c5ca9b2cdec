//! Health endpoint handler

use crate::{
    config::HealthConfig,
    error::{HcheckError, Result},
    health::{Aggregator, Completion, HealthCheck, Registry, Status},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

/// A frozen registry plus the settings it is served with.
pub struct HealthEndpoint {
    aggregator: Aggregator,
    config: HealthConfig,
}

impl HealthEndpoint {
    /// Freezes `registry` behind `config`. A path axum cannot mount as an
    /// exact route, or a zero timeout, is a [`HcheckError::Config`].
    pub fn new(registry: Registry, config: HealthConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            aggregator: Aggregator::new(Arc::new(registry), config.timeout()),
            config,
        })
    }

    pub fn path(&self) -> String {
        self.config.path()
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        self.aggregator.registry()
    }

    /// Runs one evaluation and returns the document together with the HTTP
    /// status it should be served with.
    pub async fn report(&self) -> (StatusCode, HealthCheck) {
        let start = Instant::now();
        let mut report = HealthCheck::new(chrono::Utc::now());

        let evaluation = self.aggregator.evaluate().await;
        report.status = evaluation.status;
        report.tests = evaluation.tests;

        let status_code = match (evaluation.completion, report.status) {
            (Completion::TimedOut, _) => {
                warn!("Health check timed out after {:?}", self.aggregator.timeout());
                StatusCode::SERVICE_UNAVAILABLE
            }
            (Completion::Completed, Status::Unavailable) => {
                warn!("System health is unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
            (Completion::Completed, Status::Degraded) => {
                warn!("System health is degraded");
                StatusCode::OK
            }
            (Completion::Completed, Status::Available) => StatusCode::OK,
        };

        report.duration = start.elapsed();
        (status_code, report)
    }
}

pub async fn handle_health(State(endpoint): State<Arc<HealthEndpoint>>) -> Response {
    info!("{} - Running health checks", endpoint.path());

    let (status_code, report) = endpoint.report().await;

    match serde_json::to_vec(&report) {
        Ok(body) => (
            status_code,
            [(header::CONTENT_TYPE, mime::APPLICATION_JSON.essence_str())],
            body,
        )
            .into_response(),
        Err(err) => HcheckError::Serialization(err).into_response(),
    }
}
