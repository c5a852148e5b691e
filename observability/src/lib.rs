//! # Relay Observability
//!
//! Structured logging setup and `metrics` counters for every relay
//! component. With no metrics recorder installed, recording is a no-op.

pub mod logging;
pub mod telemetry;

pub use logging::{init, init_tracing};
pub use telemetry::{RelayTelemetry, RequestTimer};
