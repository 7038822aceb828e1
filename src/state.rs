//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::ping::PingService;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ping: Arc<PingService>,
}

impl AppState {
    /// Creates a new application state from the loaded configuration and ping service.
    pub fn new(config: Config, ping: PingService) -> Self {
        Self {
            config: Arc::new(config),
            ping: Arc::new(ping),
        }
    }
}
