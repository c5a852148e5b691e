//! # Relay Errors
//!
//! Error handling for the completion relay.
//!
//! Every failure the relay can observe collapses into [`RelayError`]. The
//! detailed variants keep enough context for logging; [`RelayError::kind`]
//! maps them onto the four caller-facing categories (connection, timeout,
//! stream, agent) plus configuration problems.

use std::time::Duration;

use thiserror::Error;

/// Relay-wide error type.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Timeout: operation took longer than {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Stream error: {reason}")]
    Stream { reason: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Connection failed after {attempts} attempts: {last}")]
    Connection {
        attempts: u32,
        #[source]
        last: Box<RelayError>
    },

    #[error("Agent error {code}: {message}")]
    Agent { code: i64, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String }
}

/// Caller-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Timeout,
    Stream,
    Agent,
    Configuration
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Classify a `reqwest` failure for a call made with the given deadline.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            RelayError::Timeout {
                timeout_ms: timeout.as_millis() as u64
            }
        } else if err.is_decode() {
            RelayError::InvalidResponse {
                reason: err.to_string()
            }
        } else if err.is_builder() {
            RelayError::Configuration {
                message: err.to_string()
            }
        } else {
            RelayError::Network {
                reason: err.to_string()
            }
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        RelayError::Configuration {
            message: message.into()
        }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        RelayError::InvalidResponse {
            reason: reason.into()
        }
    }

    /// Category of the failure. An exhausted retry sequence reports the
    /// category of its last attempt, so a final deadline expiry is a timeout.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Connection { last, .. } => last.kind(),
            RelayError::Timeout { .. } => ErrorKind::Timeout,
            RelayError::Stream { .. } => ErrorKind::Stream,
            RelayError::Agent { .. } => ErrorKind::Agent,
            RelayError::Configuration { .. } => ErrorKind::Configuration,
            RelayError::UpstreamStatus { .. }
            | RelayError::Network { .. }
            | RelayError::InvalidResponse { .. } => ErrorKind::Connection
        }
    }

    /// True when the failure was a deadline expiry, including the last
    /// attempt of an exhausted retry sequence.
    pub fn is_timeout(&self) -> bool {
        match self {
            RelayError::Timeout { .. } => true,
            RelayError::Connection { last, .. } => last.is_timeout(),
            _ => false
        }
    }

    /// Failures worth another attempt against the upstream.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::UpstreamStatus { .. }
                | RelayError::Network { .. }
                | RelayError::Timeout { .. }
        )
    }

    /// The innermost error of a retry wrapper.
    pub fn root(&self) -> &RelayError {
        match self {
            RelayError::Connection { last, .. } => last.root(),
            other => other
        }
    }

    /// Stable code used in metrics labels and agent envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            RelayError::Network { .. } => "NETWORK",
            RelayError::Timeout { .. } => "TIMEOUT",
            RelayError::Stream { .. } => "STREAM",
            RelayError::InvalidResponse { .. } => "INVALID_RESPONSE",
            RelayError::Connection { last, .. } if last.is_timeout() => "TIMEOUT",
            RelayError::Connection { .. } => "CONNECTION",
            RelayError::Agent { .. } => "AGENT",
            RelayError::Configuration { .. } => "CONFIGURATION"
        }
    }
}
