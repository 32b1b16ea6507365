use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use thiserror::Error;
use url::Url;

/// Default session re-validation cadence, in milliseconds.
pub const DEFAULT_SESSION_POLL_INTERVAL_MS: u64 = 30_000;

/// Default realtime keep-alive cadence, in milliseconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 25_000;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Invalid(String),
}

/// The main configuration structure for the PeopleDesk client core.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL for REST endpoints, e.g. `https://hr.example.com/api/`.
    /// Must end with a trailing slash so endpoint paths join beneath it.
    pub api_base_url: Url,

    /// WebSocket endpoint for the realtime channel.
    pub realtime_url: Url,

    /// Path of the logout endpoint relative to `api_base_url`. A 401 from
    /// this URL never triggers the forced-logout side effect.
    pub logout_path: String,

    /// Request timeout in seconds. `None` leaves the transport's own
    /// behavior in place, which is the default.
    pub request_timeout_secs: Option<u64>,

    /// Session re-validation cadence in milliseconds.
    pub session_poll_interval_ms: u64,

    /// Realtime keep-alive cadence in milliseconds.
    pub heartbeat_interval_ms: u64,

    /// Logging level
    pub log_level: String,
}

impl Config {
    /// Generates a default configuration.
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: Url::parse("http://localhost:8080/api/").expect("static URL"),
            realtime_url: Url::parse("ws://localhost:8080/ws").expect("static URL"),
            logout_path: "auth/logout".to_string(),
            request_timeout_secs: None,
            session_poll_interval_ms: DEFAULT_SESSION_POLL_INTERVAL_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            log_level: "info".to_string(),
        }
    }

    /// Loads the configuration from a file, environment variables, or
    /// defaults.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to the configuration file.
    /// * `server_override` - Optional server base URL; overrides both the
    ///   REST base and the realtime endpoint derived from it.
    ///
    /// # Returns
    /// A [`Config`] with all values resolved, or an error if loading fails.
    pub fn load_config(
        config_path: Option<PathBuf>,
        server_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::with_defaults();

        // Load from file if provided
        if let Some(path) = config_path {
            let content = fs::read_to_string(&path)?;
            let file_config: Config = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => serde_yml::from_str(&content)?,
                Some("json") => serde_json::from_str(&content)?,
                _ => {
                    return Err(ConfigError::Invalid(
                        "Unsupported configuration format. Use 'yaml' or 'json'.".to_string(),
                    ));
                }
            };
            config = file_config;
        }

        // Use environment variables only if values are not already set
        let defaults = Config::with_defaults();
        if config.api_base_url == defaults.api_base_url {
            if let Ok(base) = env::var("PEOPLEDESK_API_BASE_URL") {
                config.api_base_url = Url::parse(&base)?;
            }
        }
        if config.realtime_url == defaults.realtime_url {
            if let Ok(endpoint) = env::var("PEOPLEDESK_REALTIME_URL") {
                config.realtime_url = Url::parse(&endpoint)?;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(log_level) = env::var("PEOPLEDESK_LOG_LEVEL") {
                config.log_level = log_level;
            }
        }
        if config.request_timeout_secs.is_none() {
            if let Ok(timeout) = env::var("PEOPLEDESK_REQUEST_TIMEOUT_SECS") {
                config.request_timeout_secs = Some(timeout.parse().map_err(|_| {
                    ConfigError::Invalid(
                        "Invalid PEOPLEDESK_REQUEST_TIMEOUT_SECS value: must be a number of seconds"
                            .to_string(),
                    )
                })?);
            }
        }

        // Override with command-line arguments if provided
        if let Some(server) = server_override {
            config.realtime_url = derive_realtime_url(&server)?;
            config.api_base_url = server.join("api/")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// The absolute URL of the logout endpoint.
    pub fn logout_url(&self) -> Result<Url, url::ParseError> {
        self.api_base_url.join(&self.logout_path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.api_base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid API base URL scheme '{other}'. Use http or https."
                )));
            }
        }
        match self.realtime_url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid realtime URL scheme '{other}'. Use ws or wss."
                )));
            }
        }
        if self.session_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "Invalid session poll interval. Must be greater than 0.".to_string(),
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "Invalid heartbeat interval. Must be greater than 0.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Derive the realtime endpoint from a server base URL by swapping the
/// scheme to its WebSocket counterpart and appending the `/ws` path.
fn derive_realtime_url(server: &Url) -> Result<Url, ConfigError> {
    let mut realtime = server.join("ws")?;
    let scheme = match server.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(ConfigError::Invalid(format!(
                "Cannot derive a realtime URL from scheme '{other}'"
            )));
        }
    };
    realtime
        .set_scheme(scheme)
        .map_err(|()| ConfigError::Invalid("Cannot derive a realtime URL".to_string()))?;
    Ok(realtime)
}
