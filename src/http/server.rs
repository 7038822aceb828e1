//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address {addr:?}: {source}")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("Failed to bind server: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Address for `port` on all interfaces.
pub fn listen_addr(port: &str) -> Result<SocketAddr, ServerError> {
    let addr = format!("0.0.0.0:{}", port);
    addr.parse::<SocketAddr>().map_err(|source| ServerError::Address { addr, source })
}

/// Bind the configured port and serve `app` on it.
///
/// This function blocks for as long as the server runs.
pub async fn start_server(app: Router, config: &Config) -> Result<(), ServerError> {
    let addr = listen_addr(&config.port)?;
    let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;

    tracing::info!(
        %addr,
        endpoint = %config.endpoint,
        read_timeout_ms = config.server_read_timeout.as_millis() as u64,
        write_timeout_ms = config.server_write_timeout.as_millis() as u64,
        "Starting HTTP server"
    );

    serve(listener, app).await
}

/// Serve `app` on an already bound listener.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), ServerError> {
    axum::serve(listener, app).await.map_err(ServerError::Server)
}
