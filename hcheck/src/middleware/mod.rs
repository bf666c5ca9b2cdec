//! Middleware for the health endpoint and the router it is mounted in

pub mod cache_control;
pub mod logging;

pub use cache_control::{no_store, no_store_layer};
pub use logging::with_tracing;

use axum::routing::MethodRouter;

/// A transform applied to the health endpoint's route before it is mounted.
///
/// Entries run in order, so the first one ends up innermost and the last one
/// outermost.
pub type MiddlewareFn = Box<dyn FnOnce(MethodRouter) -> MethodRouter + Send>;
