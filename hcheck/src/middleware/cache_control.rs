use super::MiddlewareFn;
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

/// Marks the response as uncacheable so proxies never serve a stale health report.
pub async fn no_store(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub fn no_store_layer() -> MiddlewareFn {
    Box::new(|route: MethodRouter| -> MethodRouter {
        route.layer(middleware::from_fn(no_store))
    })
}
