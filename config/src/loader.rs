//! # Environment Variable Loader
//!
//! Loads configuration from `RELAY_*` environment variables. Unset variables
//! keep their defaults; a set but unparsable variable is an error.
//!
//! ## Environment Variables
//! - `RELAY_BASE_URL`, `RELAY_API_KEY`, `RELAY_TIMEOUT_MS`,
//!   `RELAY_MAX_RETRIES`, `RELAY_RETRY_DELAY_MS`, `RELAY_HEALTH_TIMEOUT_MS`,
//!   `RELAY_DEFAULT_MODEL`
//! - `RELAY_CACHE_TTL_MS`, `RELAY_USE_MOCK_DATA`, `RELAY_CACHE_RESPONSES`,
//!   `RELAY_LOG_FAILURES`
//! - `RELAY_AGENT_URL`, `RELAY_AGENT_TIMEOUT_MS`, `RELAY_USER_ID`
//! - `RELAY_LOG_LEVEL`

use std::env;

use validator::Validate;

use crate::config::{
    AgentConfig, ConnectionConfig, FallbackConfig, ObservabilityConfig, RelayConfig
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors)
}

/// Load and validate configuration from environment variables.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("Upstream: {}", config.connection.base_url);
///     Ok(())
/// }
/// ```
pub fn load_from_env() -> Result<RelayConfig, ConfigError> {
    let config = RelayConfig {
        connection: load_connection_from_env()?,
        fallback: load_fallback_from_env()?,
        agent: load_agent_from_env()?,
        observability: load_observability_from_env()
    };
    config.validate()?;
    tracing::debug!(base_url = %config.connection.base_url, "Loaded relay configuration from environment");
    Ok(config)
}

fn load_connection_from_env() -> Result<ConnectionConfig, ConfigError> {
    let mut config = ConnectionConfig::default();
    if let Ok(base_url) = env::var("RELAY_BASE_URL") {
        config.base_url = base_url;
    }
    config.api_key = env::var("RELAY_API_KEY").ok();
    if let Some(timeout_ms) = parse_env("RELAY_TIMEOUT_MS")? {
        config.timeout_ms = timeout_ms;
    }
    if let Some(max_retries) = parse_env("RELAY_MAX_RETRIES")? {
        config.max_retries = max_retries;
    }
    if let Some(retry_delay_ms) = parse_env("RELAY_RETRY_DELAY_MS")? {
        config.retry_delay_ms = retry_delay_ms;
    }
    if let Some(health_timeout_ms) = parse_env("RELAY_HEALTH_TIMEOUT_MS")? {
        config.health_timeout_ms = health_timeout_ms;
    }
    if let Ok(model) = env::var("RELAY_DEFAULT_MODEL") {
        config.default_model = model;
    }
    Ok(config)
}

fn load_fallback_from_env() -> Result<FallbackConfig, ConfigError> {
    let defaults = FallbackConfig::default();
    Ok(FallbackConfig {
        use_mock_data: parse_env("RELAY_USE_MOCK_DATA")?.unwrap_or(defaults.use_mock_data),
        cache_responses: parse_env("RELAY_CACHE_RESPONSES")?.unwrap_or(defaults.cache_responses),
        cache_ttl_ms: parse_env("RELAY_CACHE_TTL_MS")?.unwrap_or(defaults.cache_ttl_ms),
        log_failures: parse_env("RELAY_LOG_FAILURES")?.unwrap_or(defaults.log_failures),
        ..defaults
    })
}

fn load_agent_from_env() -> Result<AgentConfig, ConfigError> {
    let defaults = AgentConfig::default();
    Ok(AgentConfig {
        server_url: env::var("RELAY_AGENT_URL").unwrap_or(defaults.server_url),
        timeout_ms: parse_env("RELAY_AGENT_TIMEOUT_MS")?.unwrap_or(defaults.timeout_ms),
        user_id: env::var("RELAY_USER_ID").ok(),
        endpoint_path: defaults.endpoint_path,
        session_id: defaults.session_id,
        stop_on_failure: defaults.stop_on_failure
    })
}

fn load_observability_from_env() -> ObservabilityConfig {
    let defaults = ObservabilityConfig::default();
    ObservabilityConfig {
        logging_level: env::var("RELAY_LOG_LEVEL").unwrap_or(defaults.logging_level),
        ..defaults
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value: raw
            }),
        Err(_) => Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        let config = load_from_env().unwrap();
        assert_eq!(config.connection.max_retries, 3);
        assert_eq!(config.fallback.cache_ttl_ms, 3_600_000);
        assert_eq!(config.agent.endpoint_path, "/mcp");
    }

    #[test]
    #[serial]
    fn test_load_connection_from_env() {
        unsafe {
            env::set_var("RELAY_BASE_URL", "http://models:9000");
            env::set_var("RELAY_API_KEY", "secret");
            env::set_var("RELAY_TIMEOUT_MS", "2500");
            env::set_var("RELAY_MAX_RETRIES", "5");
            env::set_var("RELAY_RETRY_DELAY_MS", "200");
            env::set_var("RELAY_HEALTH_TIMEOUT_MS", "750");
        }

        let connection = load_connection_from_env().unwrap();

        unsafe {
            env::remove_var("RELAY_BASE_URL");
            env::remove_var("RELAY_API_KEY");
            env::remove_var("RELAY_TIMEOUT_MS");
            env::remove_var("RELAY_MAX_RETRIES");
            env::remove_var("RELAY_RETRY_DELAY_MS");
            env::remove_var("RELAY_HEALTH_TIMEOUT_MS");
        }

        assert_eq!(connection.base_url, "http://models:9000");
        assert_eq!(connection.api_key.as_deref(), Some("secret"));
        assert_eq!(connection.timeout_ms, 2500);
        assert_eq!(connection.max_retries, 5);
        assert_eq!(connection.retry_delay_ms, 200);
        assert_eq!(connection.health_timeout_ms, 750);
        assert_eq!(connection.completions_path, "/v1/completions");
    }

    #[test]
    #[serial]
    fn test_load_fallback_and_agent_from_env() {
        unsafe {
            env::set_var("RELAY_USE_MOCK_DATA", "false");
            env::set_var("RELAY_CACHE_TTL_MS", "60000");
            env::set_var("RELAY_AGENT_URL", "http://agent:3000");
            env::set_var("RELAY_USER_ID", "user-7");
        }

        let fallback = load_fallback_from_env().unwrap();
        let agent = load_agent_from_env().unwrap();

        unsafe {
            env::remove_var("RELAY_USE_MOCK_DATA");
            env::remove_var("RELAY_CACHE_TTL_MS");
            env::remove_var("RELAY_AGENT_URL");
            env::remove_var("RELAY_USER_ID");
        }

        assert!(!fallback.use_mock_data);
        assert_eq!(fallback.cache_ttl_ms, 60_000);
        assert!(fallback.cache_responses);
        assert_eq!(agent.server_url, "http://agent:3000");
        assert_eq!(agent.user_id.as_deref(), Some("user-7"));
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_error() {
        unsafe {
            env::set_var("RELAY_MAX_RETRIES", "lots");
        }

        let result = load_from_env();

        unsafe {
            env::remove_var("RELAY_MAX_RETRIES");
        }

        match result {
            Err(ConfigError::InvalidEnv { key, value }) => {
                assert_eq!(key, "RELAY_MAX_RETRIES");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidEnv, got {other:?}")
        }
    }

    #[test]
    #[serial]
    fn test_out_of_range_value_fails_validation() {
        unsafe {
            env::set_var("RELAY_MAX_RETRIES", "0");
        }

        let result = load_from_env();

        unsafe {
            env::remove_var("RELAY_MAX_RETRIES");
        }

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
