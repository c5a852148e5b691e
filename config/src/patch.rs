//! Partial updates merged onto live configurations.
//!
//! Every field is optional; `None` leaves the current value untouched.

use serde::{Deserialize, Serialize};

use crate::config::{ConnectionConfig, FallbackConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfigPatch {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub default_model: Option<String>
}

impl ConnectionConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ConnectionConfig {
    /// Merge a patch, returning true when the upstream URL changed.
    pub fn apply(&mut self, patch: ConnectionConfigPatch) -> bool {
        let mut url_changed = false;
        if let Some(base_url) = patch.base_url {
            url_changed = base_url != self.base_url;
            self.base_url = base_url;
        }
        if let Some(api_key) = patch.api_key {
            self.api_key = Some(api_key);
        }
        if let Some(timeout_ms) = patch.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(max_retries) = patch.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(retry_delay_ms) = patch.retry_delay_ms {
            self.retry_delay_ms = retry_delay_ms;
        }
        if let Some(default_model) = patch.default_model {
            self.default_model = default_model;
        }
        url_changed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfigPatch {
    pub use_mock_data: Option<bool>,
    pub cache_responses: Option<bool>,
    pub cache_ttl_ms: Option<u64>,
    pub log_failures: Option<bool>,
    pub mock_stream_delay_ms: Option<u64>
}

impl FallbackConfig {
    pub fn apply(&mut self, patch: FallbackConfigPatch) {
        if let Some(use_mock_data) = patch.use_mock_data {
            self.use_mock_data = use_mock_data;
        }
        if let Some(cache_responses) = patch.cache_responses {
            self.cache_responses = cache_responses;
        }
        if let Some(cache_ttl_ms) = patch.cache_ttl_ms {
            self.cache_ttl_ms = cache_ttl_ms;
        }
        if let Some(log_failures) = patch.log_failures {
            self.log_failures = log_failures;
        }
        if let Some(delay) = patch.mock_stream_delay_ms {
            self.mock_stream_delay_ms = delay;
        }
    }
}
