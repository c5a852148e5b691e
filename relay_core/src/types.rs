use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// A single text-completion call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub model: Option<String>,
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    #[serde(default)]
    pub stream: bool
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens
        }
    }
}

/// Produced once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub id: String,
    pub text: String,
    pub model: String,
    pub usage: Option<Usage>,
    pub timestamp: DateTime<Utc>
}

/// Where a response handed back by the fallback wrapper came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseSource {
    Upstream,
    Cache,
    Mock
}

/// A value tagged with its [`ResponseSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ResponseSource
}

impl<T> Sourced<T> {
    pub fn new(value: T, source: ResponseSource) -> Self {
        Self { value, source }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == ResponseSource::Mock
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>
}

/// Conversational state threaded through every agent call.
///
/// The history only grows, except through [`SessionContext::clear_history`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub conversation_history: Vec<HistoryEntry>,
    pub metadata: HashMap<String, serde_json::Value>
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id,
            conversation_history: Vec::new(),
            metadata: HashMap::new()
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.conversation_history.push(HistoryEntry {
            role,
            content: content.into(),
            timestamp: Utc::now()
        });
    }

    pub fn clear_history(&mut self) {
        self.conversation_history.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnvelopeType {
    Request,
    Response,
    Notification
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: i64,
    pub message: String
}

/// Wire message exchanged with the remote agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>
}

impl Envelope {
    /// A request envelope with a fresh id.
    pub fn request(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            kind: EnvelopeType::Request,
            id: Some(Uuid::new_v4().to_string()),
            method: Some(method.into()),
            params: Some(params),
            result: None,
            error: None
        }
    }

    /// Split a reply into its result or the agent's error.
    pub fn into_result(self) -> errors::Result<serde_json::Value> {
        if let Some(err) = self.error {
            return Err(errors::RelayError::Agent {
                code: err.code,
                message: err.message
            });
        }
        Ok(self.result.unwrap_or(serde_json::Value::Null))
    }
}
