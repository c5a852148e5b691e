use std::sync::Arc;

use agent_client::AgentClient;
use config::RelayConfig;
use connection::ConnectionManager;
use errors::{RelayError, Result};
use fallback::FallbackWrapper;
use observability::{RelayTelemetry, RequestTimer};
use relay_core::{
    ChannelObserver, CompletionBackend, CompletionRequest, ObserverSet, SessionContext,
    WorkflowEvent, WorkflowObserver
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::workflow::{StepOutcome, StepResult, StepStatus, WorkflowResult, WorkflowStep};

const COMPONENT: &str = "workflow";

/// Composes direct completion steps and remote agent steps into one
/// ordered run.
pub struct Orchestrator {
    direct: Arc<dyn CompletionBackend>,
    agent: AgentClient,
    observers: ObserverSet
}

impl Orchestrator {
    pub fn new(direct: Arc<dyn CompletionBackend>, agent: AgentClient) -> Self {
        Self {
            direct,
            agent,
            observers: ObserverSet::new()
        }
    }

    /// Default stack: connection manager behind the fallback wrapper for
    /// direct steps, plus an agent client.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let manager = ConnectionManager::new(config.connection.clone())?;
        let wrapper = FallbackWrapper::new(Arc::new(manager), config.fallback.clone());
        let agent = AgentClient::new(config.agent.clone())?;
        info!(
            upstream = %config.connection.base_url,
            agent = %config.agent.server_url,
            "Orchestrator initialized"
        );
        Ok(Self::new(Arc::new(wrapper), agent))
    }

    /// Load `RELAY_*` settings, initialize logging and metrics, then build
    /// the default stack.
    pub fn from_env() -> Result<Self> {
        let config = config::load_from_env()
            .map_err(|e| RelayError::configuration(e.to_string()))?;
        observability::init(&config.observability);
        Self::from_config(&config)
    }

    pub fn direct(&self) -> &Arc<dyn CompletionBackend> {
        &self.direct
    }

    pub fn agent(&self) -> &AgentClient {
        &self.agent
    }

    pub fn subscribe(&self, observer: Arc<dyn WorkflowObserver>) {
        self.observers.subscribe(observer);
    }

    pub fn event_channel(&self) -> mpsc::UnboundedReceiver<WorkflowEvent> {
        let (observer, receiver) = ChannelObserver::new();
        self.observers.subscribe(Arc::new(observer));
        receiver
    }

    /// Run `steps` in order. Never fails; a failed step halts the run unless
    /// it is marked `continue_past_failure`, and every later step is then
    /// reported as skipped.
    pub async fn execute_workflow(&self, steps: &[WorkflowStep]) -> WorkflowResult {
        let mut outcomes = Vec::with_capacity(steps.len());
        let mut halted = false;

        for (index, step) in steps.iter().enumerate() {
            if halted {
                outcomes.push(StepOutcome::skipped(&step.name));
                continue;
            }

            let outcome = self.run_step(step).await;
            match outcome.status {
                StepStatus::Success => self.observers.emit(&WorkflowEvent::StepComplete {
                    index,
                    name: step.name.clone(),
                    execution_time_ms: outcome.execution_time_ms
                }),
                _ => {
                    self.observers.emit(&WorkflowEvent::Error {
                        index,
                        name: step.name.clone(),
                        error: outcome.error.clone().unwrap_or_default()
                    });
                    if !step.continue_past_failure {
                        warn!(step = %step.name, index, "Workflow halted by failed step");
                        halted = true;
                    }
                }
            }
            outcomes.push(outcome);
        }

        let result = WorkflowResult::from_outcomes(outcomes);
        self.observers.emit(&WorkflowEvent::Finished {
            success: result.success
        });
        info!(
            success = result.success,
            steps = result.steps.len(),
            total_ms = result.total_execution_time_ms,
            "Workflow finished"
        );
        result
    }

    async fn run_step(&self, step: &WorkflowStep) -> StepOutcome {
        let timer = RequestTimer::new(COMPONENT);

        let (backend, outcome) = match &step.model_override {
            Some(model) => {
                debug!(step = %step.name, %model, "Running direct step");
                let request = step.completion_request(model);
                match self.direct.complete(&request).await {
                    Ok(response) => (
                        "direct",
                        StepOutcome::completed(
                            &step.name,
                            StepResult::Completion(response),
                            timer.finish()
                        )
                    ),
                    Err(e) => (
                        "direct",
                        StepOutcome::failed(&step.name, e.to_string(), timer.finish())
                    )
                }
            }
            None => {
                debug!(step = %step.name, "Delegating step to agent");
                let response = self
                    .agent
                    .send_request(&step.task, step.params.clone(), None)
                    .await;
                (
                    "agent",
                    StepOutcome::completed(&step.name, StepResult::Agent(response), timer.finish())
                )
            }
        };

        let status = match outcome.status {
            StepStatus::Success => "success",
            _ => "failure"
        };
        RelayTelemetry::record_workflow_step(backend, status);
        outcome
    }

    /// Feed each task the previous answer as context and return the last
    /// answer. The first task is sent as is; an empty list yields "".
    pub async fn chain_tasks<S>(&self, tasks: &[S]) -> Result<String>
    where
        S: AsRef<str> + Sync
    {
        let mut previous: Option<String> = None;
        for task in tasks {
            let prompt = match &previous {
                Some(context) => format!("Context: {context}\n\nTask: {}", task.as_ref()),
                None => task.as_ref().to_string()
            };
            let response = self.direct.complete(&CompletionRequest::new(prompt)).await?;
            previous = Some(response.text);
        }
        Ok(previous.unwrap_or_default())
    }

    pub fn agent_context(&self) -> SessionContext {
        self.agent.context()
    }

    pub fn set_agent_metadata(&self, key: impl Into<String>, value: Value) {
        self.agent.set_metadata(key, value);
    }

    pub fn clear_agent_history(&self) {
        self.agent.clear_history();
    }

    /// Drop the agent's and the orchestrator's event subscribers.
    pub fn disconnect(&self) {
        self.observers.clear();
        self.agent.disconnect();
    }
}
