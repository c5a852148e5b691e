//! # Configuration Structures
//!
//! All configuration structures for the completion relay.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization with per-field defaults
//! - Use `validator` for input validation

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level configuration aggregating every relay component.
///
/// ## Usage
/// ```rust,no_run
/// use config::RelayConfig;
///
/// let config = RelayConfig::default();
/// println!("Upstream: {}", config.connection.base_url);
/// ```
///
/// ## Validation
/// All nested configurations must pass their own validation rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct RelayConfig {
    /// Upstream completion endpoint settings
    #[serde(default)]
    #[validate(nested)]
    pub connection: ConnectionConfig,

    /// Cache, failure log and mock fallback settings
    #[serde(default)]
    #[validate(nested)]
    pub fallback: FallbackConfig,

    /// Remote agent settings
    #[serde(default)]
    #[validate(nested)]
    pub agent: AgentConfig,

    /// Logging and metrics settings
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

/// Upstream completion endpoint configuration.
///
/// ## Fields
/// - `base_url`: Upstream root URL
/// - `api_key`: Sent as a bearer token when present
/// - `timeout_ms`: Deadline for each HTTP call (default: 30000)
/// - `max_retries`: Total attempts per request (default: 3)
/// - `retry_delay_ms`: Base backoff delay, doubled per attempt (default: 1000)
/// - `default_model`: Model used when a request names none
/// - `health_cache_ttl_ms`: How long a health probe result is reused (default: 5000)
/// - `health_timeout_ms`: Deadline for the health probe alone (default: 5000)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ConnectionConfig {
    #[serde(default = "default_base_url")]
    #[validate(length(min = 1))]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    #[validate(range(min = 1, max = 20))]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_model")]
    #[validate(length(min = 1))]
    pub default_model: String,

    #[serde(default = "default_health_cache_ttl_ms")]
    pub health_cache_ttl_ms: u64,

    #[serde(default = "default_health_timeout_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub health_timeout_ms: u64,

    #[serde(default = "default_completions_path")]
    #[validate(custom(function = "validate_path"))]
    pub completions_path: String,

    #[serde(default = "default_health_path")]
    #[validate(custom(function = "validate_path"))]
    pub health_path: String
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_health_cache_ttl_ms() -> u64 {
    5_000
}

fn default_health_timeout_ms() -> u64 {
    5_000
}

fn default_completions_path() -> String {
    "/v1/completions".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn validate_path(value: &str) -> Result<(), validator::ValidationError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(validator::ValidationError::new("Path must start with '/'"))
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            default_model: default_model(),
            health_cache_ttl_ms: default_health_cache_ttl_ms(),
            health_timeout_ms: default_health_timeout_ms(),
            completions_path: default_completions_path(),
            health_path: default_health_path()
        }
    }
}

impl ConnectionConfig {
    /// Short timeouts and delays for tests against a local mock server.
    pub fn for_testing(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: 1_000,
            health_timeout_ms: 1_000,
            retry_delay_ms: 10,
            ..Self::default()
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Fallback wrapper configuration.
///
/// `mock_fill_ratio` is the share of `max_tokens` that synthesized mock
/// text is padded towards.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct FallbackConfig {
    #[serde(default = "default_true")]
    pub use_mock_data: bool,

    #[serde(default = "default_true")]
    pub cache_responses: bool,

    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    #[serde(default = "default_true")]
    pub log_failures: bool,

    #[serde(default = "default_mock_stream_delay_ms")]
    pub mock_stream_delay_ms: u64,

    #[serde(default = "default_mock_fill_ratio")]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub mock_fill_ratio: f64,

    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1))]
    pub default_max_tokens: u32
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_ms() -> u64 {
    3_600_000
}

fn default_mock_stream_delay_ms() -> u64 {
    10
}

fn default_mock_fill_ratio() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            use_mock_data: true,
            cache_responses: true,
            cache_ttl_ms: default_cache_ttl_ms(),
            log_failures: true,
            mock_stream_delay_ms: default_mock_stream_delay_ms(),
            mock_fill_ratio: default_mock_fill_ratio(),
            default_max_tokens: default_max_tokens()
        }
    }
}

/// Remote agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_agent_url")]
    #[validate(length(min = 1))]
    pub server_url: String,

    #[serde(default = "default_agent_endpoint")]
    #[validate(custom(function = "validate_path"))]
    pub endpoint_path: String,

    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub timeout_ms: u64,

    /// Fixed session id; a fresh one is generated when absent
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    /// Stop a workflow at the first failed task
    #[serde(default = "default_true")]
    pub stop_on_failure: bool
}

fn default_agent_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_agent_endpoint() -> String {
    "/mcp".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_url: default_agent_url(),
            endpoint_path: default_agent_endpoint(),
            timeout_ms: default_timeout_ms(),
            session_id: None,
            user_id: None,
            stop_on_failure: true
        }
    }
}

impl AgentConfig {
    pub fn for_testing(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            timeout_ms: 1_000,
            ..Self::default()
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.server_url.trim_end_matches('/'),
            self.endpoint_path
        )
    }
}

/// Logging and metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "default_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool
}

fn default_logging_level() -> String {
    "info".to_string()
}

fn validate_logging_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level"))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_level: default_logging_level(),
            metrics_enabled: true
        }
    }
}
