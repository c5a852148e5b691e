//! # Configuration System
//!
//! Centralized configuration management for the completion relay.
//!
//! This crate provides:
//! - Configuration structures for every relay component
//! - Environment variable loading (`RELAY_*`)
//! - TOML file loading
//! - Partial updates applied to live configurations
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod patch;
pub mod validation;

pub use config::{
    AgentConfig, ConnectionConfig, FallbackConfig, ObservabilityConfig, RelayConfig
};
pub use file_loader::{ConfigFileError, load_from_toml};
pub use loader::{ConfigError, load_from_env};
pub use patch::{ConnectionConfigPatch, FallbackConfigPatch};
pub use validation::validate;
pub use validator::Validate;
