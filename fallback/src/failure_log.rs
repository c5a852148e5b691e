use chrono::{DateTime, Utc};
use errors::RelayError;
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureLogEntry {
    pub prompt: String,
    pub error: String,
    pub occurred_at: DateTime<Utc>
}

/// Append-only record of upstream failures, cleared only on request.
#[derive(Debug, Default)]
pub struct FailureLog {
    entries: Mutex<Vec<FailureLogEntry>>
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, prompt: &str, error: &RelayError) {
        self.entries.lock().push(FailureLogEntry {
            prompt: prompt.to_string(),
            error: error.to_string(),
            occurred_at: Utc::now()
        });
    }

    pub fn entries(&self) -> Vec<FailureLogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
