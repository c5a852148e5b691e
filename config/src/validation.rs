//! # Configuration Validation
//!
//! Validation for every configuration structure using the `validator` crate.
//!
//! ## Validation Rules
//! - `connection.base_url`, `agent.server_url`: non-empty
//! - `connection.timeout_ms`, `agent.timeout_ms`: 1-600000
//! - `connection.max_retries`: 1-20
//! - `completions_path`, `health_path`, `endpoint_path`: start with `/`
//! - `fallback.mock_fill_ratio`: greater than 0, at most 1
//! - `observability.logging_level`: trace, debug, info, warn or error

use validator::Validate;

use crate::config::RelayConfig;

pub fn validate(config: &RelayConfig) -> Result<(), validator::ValidationErrors> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_base_url() {
        let mut config = RelayConfig::default();
        config.connection.base_url = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_zero_retries() {
        let mut config = RelayConfig::default();
        config.connection.max_retries = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let mut config = RelayConfig::default();
        config.connection.timeout_ms = 0;
        assert!(validate(&config).is_err());

        config.connection.timeout_ms = 600_001;
        assert!(validate(&config).is_err());

        config.connection.timeout_ms = 600_000;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_fill_ratio() {
        let mut config = RelayConfig::default();
        config.fallback.mock_fill_ratio = 0.0;
        assert!(validate(&config).is_err());

        config.fallback.mock_fill_ratio = 1.0;
        assert!(validate(&config).is_ok());

        config.fallback.mock_fill_ratio = 1.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_paths() {
        let mut config = RelayConfig::default();
        config.agent.endpoint_path = "mcp".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_logging_level() {
        let mut config = RelayConfig::default();
        config.observability.logging_level = "verbose".to_string();
        assert!(validate(&config).is_err());
    }
}
