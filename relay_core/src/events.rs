use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::traits::WorkflowObserver;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum WorkflowEvent {
    StepComplete {
        index: usize,
        name: String,
        execution_time_ms: u64
    },
    Error {
        index: usize,
        name: String,
        error: String
    },
    Finished {
        success: bool
    }
}

/// Ordered list of subscribers.
#[derive(Default)]
pub struct ObserverSet {
    observers: RwLock<Vec<Arc<dyn WorkflowObserver>>>
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn WorkflowObserver>) {
        self.observers.write().push(observer);
    }

    /// Deliver to every subscriber before returning.
    pub fn emit(&self, event: &WorkflowEvent) {
        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_event(event);
        }
    }

    pub fn clear(&self) {
        self.observers.write().clear();
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Forwards every event into an unbounded channel.
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<WorkflowEvent>
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl WorkflowObserver for ChannelObserver {
    fn on_event(&self, event: &WorkflowEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!("Workflow event receiver dropped");
        }
    }
}
