//! # Configuration File Loading
//!
//! Loads a complete [`RelayConfig`] from a TOML file. Missing sections and
//! fields fall back to their defaults.

use std::path::Path;

use validator::Validate;

use crate::config::RelayConfig;

/// Configuration file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors)
}

/// Load and validate configuration from a TOML file.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_toml(Path::new("relay.toml"))?;
///     println!("Upstream: {}", config.connection.base_url);
///     Ok(())
/// }
/// ```
pub fn load_from_toml(path: &Path) -> Result<RelayConfig, ConfigFileError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))?;

    let config: RelayConfig =
        toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))?;

    config.validate()?;
    tracing::debug!(path = %path.display(), "Loaded relay configuration file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");

        let toml_content = r#"
[connection]
base_url = "http://models.internal:8000"
api_key = "sk-test"
max_retries = 4
retry_delay_ms = 250

[fallback]
use_mock_data = false
cache_ttl_ms = 60000

[agent]
server_url = "http://agent.internal:3000"
user_id = "analyst"
stop_on_failure = false

[observability]
logging_level = "debug"
"#;
        fs::write(&path, toml_content).unwrap();

        let config = load_from_toml(&path).unwrap();
        assert_eq!(config.connection.base_url, "http://models.internal:8000");
        assert_eq!(config.connection.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.connection.max_retries, 4);
        assert_eq!(config.connection.retry_delay_ms, 250);
        assert!(!config.fallback.use_mock_data);
        assert_eq!(config.fallback.cache_ttl_ms, 60_000);
        assert_eq!(config.agent.user_id.as_deref(), Some("analyst"));
        assert!(!config.agent.stop_on_failure);
        assert_eq!(config.observability.logging_level, "debug");
    }

    #[test]
    fn test_load_from_toml_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");
        fs::write(&path, "[invalid\n").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::TomlParse(_))));
    }

    #[test]
    fn test_load_from_toml_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");
        fs::write(&path, "[observability]\nlogging_level = \"loud\"\n").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::Invalid(_))));
    }

    #[test]
    fn test_load_from_toml_not_found() {
        let path = Path::new("/nonexistent/path/relay.toml");
        let result = load_from_toml(path);
        assert!(matches!(result, Err(ConfigFileError::FileNotFound(_))));
    }
}
