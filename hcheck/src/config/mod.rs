//! Layered configuration for the health endpoint and the serving binary

pub mod settings;

pub use settings::{AppConfig, HealthConfig, ServerConfig};
