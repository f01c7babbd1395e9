//! HTTP-level middleware (cross-cutting concerns).
//!
//! Transport/infrastructure concerns applied to every route, regardless of API version.
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limits (sized from the maximum image payload)
//! - Global timeouts
//!
//! Notes:
//! - The timeout only bounds how long the client waits. Gallery handlers run on a detached
//!   task (see `api::v1::handlers::images`), so a timed-out request still finishes or fails
//!   atomically.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for a JSON upload carrying `max_image_bytes` of base64 payload.
pub fn body_limit_for(max_image_bytes: usize) -> usize {
    // base64 grows 4/3, plus room for the title and JSON punctuation
    max_image_bytes.div_ceil(3) * 4 + 64 * 1024
}

/// Apply HTTP-level middleware to the given Router.
///
/// Defaults:
/// - Request-Id header: `x-request-id`
/// - Body limit: `body_limit` bytes (axum's 2 MiB extractor default is replaced)
/// - Timeout: 30 seconds
pub fn apply(router: Router, body_limit: usize) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        // Access log / tracing for all requests.
        .layer(TraceLayer::new_for_http());

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(layers)
}
