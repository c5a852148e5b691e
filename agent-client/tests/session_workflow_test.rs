//! End-to-end agent session against a mocked agent service.

use std::sync::Arc;

use agent_client::{AgentClient, AgentTask};
use config::AgentConfig;
use parking_lot::Mutex;
use relay_core::{WorkflowEvent, WorkflowObserver};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<WorkflowEvent>>
}

impl WorkflowObserver for Recorder {
    fn on_event(&self, event: &WorkflowEvent) {
        self.events.lock().push(event.clone());
    }
}

#[tokio::test]
async fn test_workflow_threads_history_and_reports_events() {
    testing::init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_partial_json(json!({"params": {"task": "summarize repo"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(testing::agent_result_envelope(json!("three crates")))
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_partial_json(json!({
            "params": {
                "task": "suggest refactor",
                "model": "gpt-4",
                "context": {"conversationHistory": [
                    {"role": "user", "content": "summarize repo"},
                    {"role": "assistant", "content": "three crates"}
                ]}
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(testing::agent_result_envelope(json!({"steps": 2})))
        )
        .expect(1)
        .mount(&server)
        .await;

    let session_id = testing::unique_session_id();
    let client = AgentClient::new(AgentConfig {
        session_id: Some(session_id.clone()),
        ..testing::agent_config_for(&server)
    })
    .unwrap();
    let recorder = Arc::new(Recorder::default());
    client.subscribe(recorder.clone());

    let responses = client
        .execute_workflow(&[
            AgentTask::new("summary", "summarize repo"),
            AgentTask::new("refactor", "suggest refactor").with_model("gpt-4")
        ])
        .await;

    assert!(responses.iter().all(|r| r.success));
    let last = responses.last().unwrap();
    assert_eq!(last.updated_context.session_id, session_id);
    assert_eq!(last.updated_context.conversation_history.len(), 4);

    let events = recorder.events.lock().clone();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], WorkflowEvent::StepComplete { index: 0, name, .. } if name == "summary"));
    assert!(matches!(&events[1], WorkflowEvent::StepComplete { index: 1, name, .. } if name == "refactor"));
    assert_eq!(events[2], WorkflowEvent::Finished { success: true });
}

#[tokio::test]
async fn test_unreachable_agent_never_errors() {
    let client = AgentClient::new(AgentConfig::for_testing("http://127.0.0.1:9")).unwrap();

    let response = client
        .send_request("anything", Some(json!({"k": 1})), None)
        .await;

    assert!(!response.success);
    assert!(response.error.is_some());
    assert!(response.updated_context.conversation_history.is_empty());
}
