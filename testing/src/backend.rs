use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use errors::{RelayError, Result};
use parking_lot::Mutex;
use relay_core::{CompletionBackend, CompletionRequest, CompletionResponse, TextStream, Usage};

/// In-memory [`CompletionBackend`] replaying queued replies in order.
///
/// Once the queue is empty every call fails with a network error.
#[derive(Default)]
pub struct ScriptedBackend {
    calls: AtomicUsize,
    replies: Mutex<VecDeque<Result<CompletionResponse>>>,
    stream_chunks: Mutex<Option<Vec<Result<String>>>>,
    requests: Mutex<Vec<CompletionRequest>>
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texts(texts: &[&str]) -> Self {
        let backend = Self::new();
        for text in texts {
            backend.push_text(text);
        }
        backend
    }

    pub fn push_text(&self, text: &str) {
        self.replies.lock().push_back(Ok(CompletionResponse {
            id: utils::generate_id("scripted"),
            text: text.to_string(),
            model: "scripted-model".to_string(),
            usage: Some(Usage::new(1, utils::word_count(text) as u32)),
            timestamp: Utc::now()
        }));
    }

    pub fn push_error(&self, error: RelayError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Chunks handed out by the next `stream` call.
    pub fn set_stream(&self, chunks: Vec<Result<String>>) {
        *self.stream_chunks.lock() = Some(chunks);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| request.prompt.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    fn unavailable() -> RelayError {
        RelayError::Network {
            reason: "scripted backend has no reply".to_string()
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Self::unavailable()))
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        match self.stream_chunks.lock().take() {
            Some(chunks) => Ok(Box::pin(futures_util::stream::iter(chunks))),
            None => Err(Self::unavailable())
        }
    }
}
