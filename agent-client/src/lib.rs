//! # Remote Agent Client
//!
//! Drives a remote agent over single request/response envelope exchanges
//! while threading a per-session conversation context through every call.

pub mod client;
pub mod types;

pub use client::AgentClient;
pub use types::{AgentResponse, AgentTask};
