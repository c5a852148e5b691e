use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::telemetry::RelayTelemetry;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Returns false when a global
/// subscriber was already installed.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok()
}

/// Apply an [`config::ObservabilityConfig`]: logging level and metrics toggle.
pub fn init(config: &config::ObservabilityConfig) -> bool {
    RelayTelemetry::set_enabled(config.metrics_enabled);
    init_tracing(&config.logging_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        let _ = init_tracing("debug");
        assert!(!init_tracing("info"));
    }
}
