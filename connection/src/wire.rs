//! Upstream request and response bodies.

use chrono::Utc;
use relay_core::{CompletionRequest, CompletionResponse, Usage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct WireRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub stream: bool
}

impl<'a> WireRequest<'a> {
    pub fn new(request: &'a CompletionRequest, model: &'a str, stream: bool) -> Self {
        Self {
            model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    #[serde(default)]
    text: Option<String>
}

#[derive(Debug, Deserialize)]
struct RawUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: Option<u32>
}

#[derive(Debug, Deserialize)]
struct TokensUsed {
    #[serde(default)]
    input: u32,
    #[serde(default)]
    output: u32
}

/// Either the full completion shape or the simplified `{text|response}` one.
#[derive(Debug, Deserialize)]
pub struct RawCompletion {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<RawChoice>,
    model: Option<String>,
    usage: Option<RawUsage>,
    text: Option<String>,
    response: Option<String>,
    tokens_used: Option<TokensUsed>
}

impl RawCompletion {
    pub fn into_response(self, requested_model: &str) -> errors::Result<CompletionResponse> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.text)
            .or(self.text)
            .or(self.response)
            .ok_or_else(|| errors::RelayError::invalid_response("no completion text in body"))?;

        let usage = match (self.usage, self.tokens_used) {
            (Some(usage), _) => Some(Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage
                    .total_tokens
                    .unwrap_or(usage.prompt_tokens + usage.completion_tokens)
            }),
            (None, Some(tokens)) => Some(Usage::new(tokens.input, tokens.output)),
            (None, None) => None
        };

        Ok(CompletionResponse {
            id: self.id.unwrap_or_else(|| utils::generate_id("cmpl")),
            text,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            usage,
            timestamp: Utc::now()
        })
    }
}
