//! # Connection Manager
//!
//! Raw HTTP client for the upstream completion endpoint: cached health
//! probes, bounded retries with exponential backoff, and Server-Sent-Events
//! streaming.

mod health;
pub mod manager;
pub mod retry;
pub mod sse;
pub mod wire;

pub use manager::ConnectionManager;
pub use retry::RetryPolicy;
pub use sse::SseDecoder;
