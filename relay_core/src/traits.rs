//! Seams between the relay components.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::events::WorkflowEvent;
use crate::types::{CompletionRequest, CompletionResponse};

/// A lazy, non-restartable sequence of text fragments.
pub type TextStream = BoxStream<'static, errors::Result<String>>;

/// Anything that can answer a completion request.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> errors::Result<CompletionResponse>;

    async fn stream(&self, request: &CompletionRequest) -> errors::Result<TextStream>;
}

/// Produces substitute text when the upstream cannot answer.
///
/// Returning `None` means no substitute is available and the upstream error
/// should reach the caller.
pub trait MockStrategy: Send + Sync {
    fn synthesize(&self, request: &CompletionRequest) -> Option<String>;
}

/// Receives workflow progress events synchronously, in emission order.
pub trait WorkflowObserver: Send + Sync {
    fn on_event(&self, event: &WorkflowEvent);
}
