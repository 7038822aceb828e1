//! Router assembly.
//!
//! The router has exactly one route, the configured ping endpoint, answering
//! every method. Anything else falls through to axum's default 404.
//!
//! Layers, innermost first:
//! - request deadline (ping route only)
//! - request body read timeout
//! - response write timeout
//! - request ID span

pub mod ping;

use axum::{http::StatusCode, middleware, routing::any, Router};
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

use crate::middleware::{request_id_layer, request_timeout_layer, RequestTimeout};
use crate::state::AppState;

/// Creates the Axum router serving the ping endpoint.
///
/// `request_timeout` is passed in rather than built here so callers can keep a
/// handle on it (its root token and live timer count). The endpoint must
/// already have passed [`crate::config::validate_endpoint`].
pub fn create_router(state: AppState, request_timeout: RequestTimeout) -> Router {
    let config = state.config.clone();

    let ping_routes = Router::new()
        .route(&config.endpoint, any(ping::ping))
        .route_layer(middleware::from_fn_with_state(request_timeout, request_timeout_layer));

    Router::new()
        .merge(ping_routes)
        .with_state(state)
        .layer(RequestBodyTimeoutLayer::new(config.server_read_timeout))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.server_write_timeout,
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
