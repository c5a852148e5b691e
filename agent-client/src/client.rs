use std::sync::Arc;
use std::time::Duration;

use config::AgentConfig;
use errors::{RelayError, Result};
use observability::{RelayTelemetry, RequestTimer};
use parking_lot::RwLock;
use relay_core::{
    ChannelObserver, Envelope, ObserverSet, Role, SessionContext, WorkflowEvent, WorkflowObserver
};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::{AgentResponse, AgentTask};

const COMPONENT: &str = "agent";
const EXECUTE_METHOD: &str = "execute_task";

/// Client for the remote agent service.
///
/// Each call is one HTTP POST of a request [`Envelope`]; there is no
/// long-lived connection. The owned [`SessionContext`] travels with every
/// request and grows with every successful exchange.
pub struct AgentClient {
    config: AgentConfig,
    http: Client,
    context: RwLock<SessionContext>,
    observers: ObserverSet
}

impl AgentClient {
    pub fn new(config: AgentConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| RelayError::configuration(format!("HTTP client: {e}")))?;

        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(|| utils::generate_id("session"));
        let context = SessionContext::new(session_id, config.user_id.clone());

        Ok(Self {
            config,
            http,
            context: RwLock::new(context),
            observers: ObserverSet::new()
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn session_id(&self) -> String {
        self.context.read().session_id.clone()
    }

    /// Snapshot of the session context.
    pub fn context(&self) -> SessionContext {
        self.context.read().clone()
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: Value) {
        self.context.write().metadata.insert(key.into(), value);
    }

    /// Empty the conversation history; session id and metadata stay.
    pub fn clear_history(&self) {
        self.context.write().clear_history();
        debug!(session = %self.session_id(), "Agent conversation history cleared");
    }

    /// Drop every event subscriber. The session id remains valid.
    pub fn disconnect(&self) {
        self.observers.clear();
        info!(session = %self.session_id(), "Agent client disconnected");
    }

    pub fn subscribe(&self, observer: Arc<dyn WorkflowObserver>) {
        self.observers.subscribe(observer);
    }

    /// Subscribe a channel receiving every subsequent event.
    pub fn event_channel(&self) -> mpsc::UnboundedReceiver<WorkflowEvent> {
        let (observer, receiver) = ChannelObserver::new();
        self.observers.subscribe(Arc::new(observer));
        receiver
    }

    /// Send one task with the current context. Never fails: transport,
    /// status and agent errors come back as `success: false`.
    pub async fn send_request(
        &self,
        task: &str,
        params: Option<Value>,
        model: Option<&str>
    ) -> AgentResponse {
        let timer = RequestTimer::new(COMPONENT);
        let envelope = Envelope::request(
            EXECUTE_METHOD,
            json!({
                "task": task,
                "params": params,
                "model": model,
                "context": self.context()
            })
        );

        match self.exchange(&envelope).await {
            Ok(result) => {
                let updated_context = {
                    let mut context = self.context.write();
                    context.push(Role::User, task);
                    if !result.is_null() {
                        context.push(Role::Assistant, utils::stringify_value(&result));
                    }
                    context.clone()
                };
                RelayTelemetry::record_agent_call("success");
                AgentResponse {
                    success: true,
                    result: Some(result),
                    error: None,
                    execution_time_ms: timer.finish(),
                    updated_context
                }
            }
            Err(e) => {
                warn!(task = %utils::prompt_fingerprint(task), "Agent request failed: {}", e);
                RelayTelemetry::record_agent_call("failure");
                AgentResponse {
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                    execution_time_ms: timer.finish(),
                    updated_context: self.context()
                }
            }
        }
    }

    /// Run tasks in order, emitting a `StepComplete` after each success and
    /// an `Error` for each failure, then a final `Finished`.
    pub async fn execute_workflow(&self, tasks: &[AgentTask]) -> Vec<AgentResponse> {
        let mut responses = Vec::with_capacity(tasks.len());
        let mut success = true;

        for (index, task) in tasks.iter().enumerate() {
            let response = self
                .send_request(&task.task, task.params.clone(), task.model.as_deref())
                .await;

            if response.success {
                self.observers.emit(&WorkflowEvent::StepComplete {
                    index,
                    name: task.name.clone(),
                    execution_time_ms: response.execution_time_ms
                });
                responses.push(response);
            } else {
                success = false;
                self.observers.emit(&WorkflowEvent::Error {
                    index,
                    name: task.name.clone(),
                    error: response.error.clone().unwrap_or_default()
                });
                responses.push(response);
                if self.config.stop_on_failure {
                    warn!(step = %task.name, "Agent workflow stopped at failed step");
                    break;
                }
            }
        }

        self.observers.emit(&WorkflowEvent::Finished { success });
        responses
    }

    async fn exchange(&self, envelope: &Envelope) -> Result<Value> {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let resp = self
            .http
            .post(self.config.endpoint())
            .timeout(timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| RelayError::from_reqwest(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body
            });
        }

        let reply: Envelope = resp
            .json()
            .await
            .map_err(|e| RelayError::from_reqwest(e, timeout))?;
        reply.into_result()
    }
}
