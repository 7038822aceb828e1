//! ping-service entry point.
//!
//! Initializes tracing, loads configuration from the environment, builds the
//! ping service and router, and serves until the listener fails. Configuration
//! and listener errors are logged and end the process with a failure status.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ping_service::config::{Config, LogFormat, DEFAULT_LOG_FILTER};
use ping_service::http::start_server;
use ping_service::middleware::RequestTimeout;
use ping_service::routes::create_router;
use ping_service::{AppState, PingService};

/// ping-service: a twelve-factor HTTP liveness endpoint
///
/// Configured through PORT, ENDPOINT, DEFAULT_RESPONSE, REQ_TIMEOUT,
/// SERVER_READ_TIMEOUT, SERVER_WRITE_TIMEOUT and LOG_FORMAT.
#[derive(Parser, Debug)]
#[command(name = "ping-service", version, about)]
struct Args {
    /// Log level filter (e.g., "ping_service=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_tracing(filter: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(filter));

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    // Configuration is read before tracing so the log format can come from it;
    // a bad config is still reported through the (default format) subscriber.
    let config = Config::from_env();
    let format = match &config {
        Ok(config) => config.logging.log_format(),
        Err(_) => Ok(LogFormat::default()),
    };
    init_tracing(&log_filter, format.as_ref().copied().unwrap_or_default());

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = format {
        tracing::warn!(error = %e, "Unknown log format, using text");
    }

    tracing::info!(
        port = %config.port,
        endpoint = %config.endpoint,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "Loaded configuration"
    );

    let ping = PingService::new(
        config.default_response.as_str(),
        tracing::info_span!("ping", endpoint = %config.endpoint),
    );
    let request_timeout = RequestTimeout::new(config.request_timeout, CancellationToken::new());

    let state = AppState::new(config, ping);
    let app = create_router(state.clone(), request_timeout);

    match start_server(app, &state.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
