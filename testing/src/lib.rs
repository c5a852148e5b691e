//! Shared test fixtures for the relay workspace.
//!
//! Provides canned upstream payloads, agent envelopes and wiremock mounts so
//! every crate's tests talk to the same fake services:
//! - completion endpoint (`POST /v1/completions`, both response shapes)
//! - health endpoint (`GET /health`)
//! - agent endpoint (`POST /mcp`)
//!
//! [`ScriptedBackend`] stands in for the upstream when a test needs exact
//! control over each reply without HTTP.

mod backend;
mod fixtures;

pub use backend::ScriptedBackend;
pub use fixtures::*;
