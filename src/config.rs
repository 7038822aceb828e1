//! Configuration loading and constants.
//!
//! All settings come from environment variables, read once at startup into an
//! immutable [`Config`]. String settings fall back to their default when the
//! variable is unset or empty. Millisecond settings do the same, but a value
//! that is set and fails to parse is an error: the process must refuse to
//! start rather than serve with the wrong timeouts.

use std::collections::HashMap;
use std::env::VarError;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_PORT: &str = "PORT";
pub const ENV_ENDPOINT: &str = "ENDPOINT";
pub const ENV_DEFAULT_RESPONSE: &str = "DEFAULT_RESPONSE";
pub const ENV_REQUEST_TIMEOUT: &str = "REQ_TIMEOUT";
pub const ENV_SERVER_READ_TIMEOUT: &str = "SERVER_READ_TIMEOUT";
pub const ENV_SERVER_WRITE_TIMEOUT: &str = "SERVER_WRITE_TIMEOUT";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Every variable the loader reads
pub const ENV_KEYS: [&str; 7] = [
    ENV_PORT,
    ENV_ENDPOINT,
    ENV_DEFAULT_RESPONSE,
    ENV_REQUEST_TIMEOUT,
    ENV_SERVER_READ_TIMEOUT,
    ENV_SERVER_WRITE_TIMEOUT,
    ENV_LOG_FORMAT,
];

// =============================================================================
// Defaults
// =============================================================================

/// Port to listen on (all interfaces)
pub const DEFAULT_PORT: &str = "9090";

/// Path the ping route is mounted at
pub const DEFAULT_ENDPOINT: &str = "/ping";

/// Payload returned by the ping route, before JSON encoding
pub const DEFAULT_RESPONSE: &str = "PONG";

/// Per-request deadline. Should fire before the server timeouts.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 500;

/// Upper bound on reading a request body
pub const DEFAULT_SERVER_READ_TIMEOUT_MS: u64 = 1000;

/// Upper bound on producing a response
pub const DEFAULT_SERVER_WRITE_TIMEOUT_MS: u64 = 2000;

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "ping_service=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be an integer number of milliseconds, got {value:?}: {source}")]
    InvalidInteger {
        key: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("{key} is set but is not valid UTF-8: {value:?}")]
    NotUnicode {
        key: String,
        value: std::ffi::OsString,
    },
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Validation(format!(
                "{ENV_LOG_FORMAT} must be \"text\" or \"json\", got {other:?}"
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed log format. Callers fall back to text on an unknown value.
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.format.parse()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on, kept as given so the listener reports bad values
    pub port: String,
    /// Path of the single ping route
    pub endpoint: String,
    /// String served (JSON-encoded) by the ping route
    pub default_response: String,
    /// Deadline attached to every request by the timeout middleware
    pub request_timeout: Duration,
    pub server_read_timeout: Duration,
    pub server_write_timeout: Duration,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_response: DEFAULT_RESPONSE.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            server_read_timeout: Duration::from_millis(DEFAULT_SERVER_READ_TIMEOUT_MS),
            server_write_timeout: Duration::from_millis(DEFAULT_SERVER_WRITE_TIMEOUT_MS),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A variable holding bytes that are not valid UTF-8 is an error rather
    /// than being treated as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for key in ENV_KEYS {
            if let Some(value) = read_var(key)? {
                vars.insert(key, value);
            }
        }
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `lookup` returns the raw value for a key, or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = get_env(&lookup, ENV_ENDPOINT, DEFAULT_ENDPOINT);
        validate_endpoint(&endpoint)?;

        Ok(Self {
            port: get_env(&lookup, ENV_PORT, DEFAULT_PORT),
            endpoint,
            default_response: get_env(&lookup, ENV_DEFAULT_RESPONSE, DEFAULT_RESPONSE),
            request_timeout: get_env_millis(
                &lookup,
                ENV_REQUEST_TIMEOUT,
                DEFAULT_REQUEST_TIMEOUT_MS,
            )?,
            server_read_timeout: get_env_millis(
                &lookup,
                ENV_SERVER_READ_TIMEOUT,
                DEFAULT_SERVER_READ_TIMEOUT_MS,
            )?,
            server_write_timeout: get_env_millis(
                &lookup,
                ENV_SERVER_WRITE_TIMEOUT,
                DEFAULT_SERVER_WRITE_TIMEOUT_MS,
            )?,
            logging: LoggingConfig {
                format: get_env(&lookup, ENV_LOG_FORMAT, DEFAULT_LOG_FORMAT),
            },
        })
    }
}

/// Reads one process environment variable; `None` when unset.
pub fn read_var(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(value)) => Err(ConfigError::NotUnicode {
            key: key.to_string(),
            value,
        }),
    }
}

/// Checks that `endpoint` is a literal absolute path.
///
/// The endpoint is mounted as a router path, where braces capture segments
/// and a leading `:` or `*` is rejected outright. None of those may appear.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    if !endpoint.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{ENV_ENDPOINT} must start with '/', got {endpoint:?}"
        )));
    }
    if endpoint.contains(['{', '}']) {
        return Err(ConfigError::Validation(format!(
            "{ENV_ENDPOINT} must not contain '{{' or '}}', got {endpoint:?}"
        )));
    }
    if endpoint
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(ConfigError::Validation(format!(
            "{ENV_ENDPOINT} segments must not start with ':' or '*', got {endpoint:?}"
        )));
    }
    Ok(())
}

/// Returns the value for `key` if set and non-empty, else `default`.
pub fn get_env<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Reads `key` as a whole number of milliseconds, falling back to `default_ms`.
pub fn get_env_millis<F>(lookup: &F, key: &str, default_ms: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|source| ConfigError::InvalidInteger {
                key: key.to_string(),
                value,
                source,
            }),
        None => Ok(Duration::from_millis(default_ms)),
    }
}
