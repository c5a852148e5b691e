//! # Fallback Wrapper
//!
//! Makes an unreliable [`relay_core::CompletionBackend`] look dependable:
//! responses are cached by normalized prompt, failures are logged, and when
//! the upstream cannot answer a deterministic mock response is substituted.

pub mod cache;
pub mod failure_log;
pub mod mock;
pub mod wrapper;

pub use cache::{CacheEntryStats, CacheLookup, CacheStats, ResponseCache};
pub use failure_log::{FailureLog, FailureLogEntry};
pub use mock::{MOCK_MODEL, MOCK_TOKEN_CEILING, NoMockStrategy, TemplateMockStrategy, mock_response};
pub use wrapper::FallbackWrapper;
