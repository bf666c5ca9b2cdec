//! HTTP handlers served by the health endpoint

pub mod health;

pub use health::{handle_health, HealthEndpoint};
