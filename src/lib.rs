//! ping-service: a twelve-factor HTTP liveness endpoint.
//!
//! Serves a single configurable route that answers with a fixed string,
//! JSON-encoded. Everything is configured from environment variables.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod ping;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::AppError;
pub use ping::PingService;
pub use state::AppState;
