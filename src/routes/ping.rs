//! Liveness endpoint for container orchestration and load balancers.

use axum::{extract::State, response::Response};

use crate::state::AppState;

/// Ping handler.
///
/// Ignores the request deadline: answering is synchronous and never blocks.
pub async fn ping(State(state): State<AppState>) -> Response {
    state.ping.handle()
}
