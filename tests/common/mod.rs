//! Shared helpers for integration tests.

use std::time::Duration;

use axum::Router;
use ping_service::config::Config;
use ping_service::middleware::RequestTimeout;
use ping_service::routes::create_router;
use ping_service::{AppState, PingService};
use tokio_util::sync::CancellationToken;

/// Builds the full application router for `config`.
///
/// Returns the request timeout handle alongside so tests can inspect live timers.
pub fn build_app(config: Config) -> (Router, RequestTimeout) {
    let ping = PingService::new(
        config.default_response.as_str(),
        tracing::info_span!("ping", endpoint = %config.endpoint),
    );
    let request_timeout = RequestTimeout::new(config.request_timeout, CancellationToken::new());
    let app = create_router(AppState::new(config, ping), request_timeout.clone());
    (app, request_timeout)
}

pub fn config_with_response(response: &str) -> Config {
    Config {
        default_response: response.to_string(),
        ..Config::default()
    }
}

#[allow(dead_code)]
pub fn config_with_request_timeout(timeout: Duration) -> Config {
    Config {
        request_timeout: timeout,
        ..Config::default()
    }
}
