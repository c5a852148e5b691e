use agent_client::AgentResponse;
use relay_core::{CompletionRequest, CompletionResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

/// One workflow step.
///
/// A step with a `model_override` goes straight to the completion backend;
/// every other step is delegated to the remote agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub name: String,
    pub task: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub model_override: Option<String>,
    /// Keep running later steps when this one fails. The step itself is
    /// never retried.
    #[serde(default)]
    pub continue_past_failure: bool
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task: task.into(),
            params: None,
            model_override: None,
            continue_past_failure: false
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_model_override(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn continue_past_failure(mut self) -> Self {
        self.continue_past_failure = true;
        self
    }

    pub fn is_direct(&self) -> bool {
        self.model_override.is_some()
    }

    /// Completion request for a direct step. Sampling options come from
    /// `params`; values of the wrong type are ignored.
    pub(crate) fn completion_request(&self, model: &str) -> CompletionRequest {
        let mut request = CompletionRequest::new(self.task.clone()).with_model(model);
        let Some(params) = &self.params else {
            return request;
        };

        if let Some(max_tokens) = params
            .get("max_tokens")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
        {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = params.get("temperature").and_then(Value::as_f64) {
            request = request.with_temperature(temperature as f32);
        }
        if let Some(top_p) = params.get("top_p").and_then(Value::as_f64) {
            request = request.with_top_p(top_p as f32);
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum StepResult {
    Completion(CompletionResponse),
    Agent(AgentResponse)
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        match self {
            StepResult::Completion(response) => !response.text.is_empty(),
            StepResult::Agent(response) => response.success
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        match self {
            StepResult::Completion(_) => Some("completion returned no text".to_string()),
            StepResult::Agent(response) => Some(
                response
                    .error
                    .clone()
                    .unwrap_or_else(|| "agent reported failure".to_string())
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failed,
    /// Not run because an earlier step halted the workflow.
    Skipped
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub name: String,
    pub status: StepStatus,
    pub result: Option<StepResult>,
    pub error: Option<String>,
    pub execution_time_ms: u64
}

impl StepOutcome {
    pub(crate) fn completed(name: &str, result: StepResult, execution_time_ms: u64) -> Self {
        let status = if result.is_success() {
            StepStatus::Success
        } else {
            StepStatus::Failed
        };
        Self {
            name: name.to_string(),
            status,
            error: result.failure_reason(),
            result: Some(result),
            execution_time_ms
        }
    }

    pub(crate) fn failed(name: &str, error: String, execution_time_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Failed,
            result: None,
            error: Some(error),
            execution_time_ms
        }
    }

    pub(crate) fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Skipped,
            result: None,
            error: None,
            execution_time_ms: 0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub success: bool,
    pub steps: Vec<StepOutcome>,
    pub total_execution_time_ms: u64
}

impl WorkflowResult {
    pub(crate) fn from_outcomes(steps: Vec<StepOutcome>) -> Self {
        let success = steps.iter().all(|s| s.status != StepStatus::Failed);
        let total_execution_time_ms = steps
            .iter()
            .filter(|s| s.status != StepStatus::Skipped)
            .map(|s| s.execution_time_ms)
            .sum();
        Self {
            success,
            steps,
            total_execution_time_ms
        }
    }

    pub fn outcome(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.name == name)
    }
}
