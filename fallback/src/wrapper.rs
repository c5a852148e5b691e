use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use config::{FallbackConfig, FallbackConfigPatch};
use errors::{RelayError, Result};
use futures_util::StreamExt;
use observability::{RelayTelemetry, RequestTimer};
use parking_lot::RwLock;
use relay_core::{
    CompletionBackend, CompletionRequest, CompletionResponse, MockStrategy, ResponseSource,
    Sourced, TextStream
};
use tracing::{debug, info, warn};

use crate::cache::{CacheLookup, CacheStats, ResponseCache};
use crate::failure_log::{FailureLog, FailureLogEntry};
use crate::mock::{TemplateMockStrategy, mock_response};

const COMPONENT: &str = "fallback";

/// Cache, failure log and mock substitution in front of a backend.
///
/// With `use_mock_data` enabled and a strategy that produces text,
/// [`FallbackWrapper::generate`] never returns an error.
pub struct FallbackWrapper {
    backend: Arc<dyn CompletionBackend>,
    options: RwLock<FallbackConfig>,
    cache: Arc<ResponseCache>,
    failures: Arc<FailureLog>,
    mock: Arc<dyn MockStrategy>
}

impl FallbackWrapper {
    pub fn new(backend: Arc<dyn CompletionBackend>, options: FallbackConfig) -> Self {
        let mock = Arc::new(TemplateMockStrategy::from_config(&options));
        Self {
            backend,
            options: RwLock::new(options),
            cache: Arc::new(ResponseCache::new()),
            failures: Arc::new(FailureLog::new()),
            mock
        }
    }

    pub fn with_mock_strategy(mut self, mock: Arc<dyn MockStrategy>) -> Self {
        self.mock = mock;
        self
    }

    pub fn options(&self) -> FallbackConfig {
        self.options.read().clone()
    }

    pub fn update_options(&self, patch: FallbackConfigPatch) {
        self.options.write().apply(patch);
        info!("Fallback options updated");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn failure_log(&self) -> Vec<FailureLogEntry> {
        self.failures.entries()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn clear_failure_log(&self) {
        self.failures.clear();
    }

    pub async fn generate(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.generate_sourced(request).await.map(Sourced::into_inner)
    }

    /// Like [`FallbackWrapper::generate`], also reporting whether the
    /// response came from the upstream, the cache or the mock strategy.
    pub async fn generate_sourced(
        &self,
        request: &CompletionRequest
    ) -> Result<Sourced<CompletionResponse>> {
        let options = self.options();
        let key = utils::cache_key(request.model.as_deref(), &request.prompt);
        let fingerprint = utils::prompt_fingerprint(&request.prompt);

        if options.cache_responses {
            if let Some(cached) = self.lookup(&key, &options) {
                debug!(prompt = %fingerprint, "Serving completion from cache");
                return Ok(Sourced::new(cached, ResponseSource::Cache));
            }
        }

        let timer = RequestTimer::new(COMPONENT);
        match self.backend.complete(request).await {
            Ok(response) => {
                timer.finish();
                RelayTelemetry::record_request(COMPONENT, "success");
                if options.cache_responses {
                    self.cache.insert(key, response.clone());
                }
                Ok(Sourced::new(response, ResponseSource::Upstream))
            }
            Err(e) => {
                RelayTelemetry::record_request(COMPONENT, "failure");
                warn!(prompt = %fingerprint, "Upstream unavailable: {}", e);
                match substitute(&self.failures, self.mock.as_ref(), &options, request, &e) {
                    Some(text) => Ok(Sourced::new(
                        mock_response(request, text),
                        ResponseSource::Mock
                    )),
                    None => Err(e)
                }
            }
        }
    }

    /// Cache-then-network streaming.
    ///
    /// A cache hit arrives as one chunk. A stream that completes is cached
    /// as a single response. On failure, before or during the stream, the
    /// mock text is emitted word by word when enabled.
    pub async fn stream(&self, request: &CompletionRequest) -> Result<TextStream> {
        let options = self.options();
        let key = utils::cache_key(request.model.as_deref(), &request.prompt);

        if options.cache_responses {
            if let Some(cached) = self.lookup(&key, &options) {
                debug!(prompt = %utils::prompt_fingerprint(&request.prompt), "Streaming completion from cache");
                return Ok(Box::pin(futures_util::stream::once(async move {
                    Ok(cached.text)
                })));
            }
        }

        let delay = Duration::from_millis(options.mock_stream_delay_ms);
        let mut upstream = match self.backend.stream(request).await {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!(prompt = %utils::prompt_fingerprint(&request.prompt), "Stream failed: {}", e);
                return match substitute(&self.failures, self.mock.as_ref(), &options, request, &e) {
                    Some(text) => Ok(word_stream(text, delay)),
                    None => Err(e)
                };
            }
        };

        let cache = Arc::clone(&self.cache);
        let failures = Arc::clone(&self.failures);
        let mock = Arc::clone(&self.mock);
        let request = request.clone();

        let stream = async_stream::stream! {
            let mut full_text = String::new();
            let mut failure = None;

            while let Some(chunk) = upstream.next().await {
                match chunk {
                    Ok(text) => {
                        full_text.push_str(&text);
                        yield Ok(text);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            match failure {
                None => {
                    if options.cache_responses {
                        cache.insert(key, streamed_response(&request, full_text));
                    }
                }
                Some(e) => {
                    warn!(prompt = %utils::prompt_fingerprint(&request.prompt), "Stream failed: {}", e);
                    match substitute(&failures, mock.as_ref(), &options, &request, &e) {
                        Some(text) => {
                            let mut words = word_stream(text, delay);
                            while let Some(word) = words.next().await {
                                yield word;
                            }
                        }
                        None => {
                            yield Err(e);
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn lookup(&self, key: &str, options: &FallbackConfig) -> Option<CompletionResponse> {
        let lookup = self
            .cache
            .lookup(key, Duration::from_millis(options.cache_ttl_ms));
        RelayTelemetry::record_cache_lookup(lookup.label());
        match lookup {
            CacheLookup::Hit(response) => Some(response),
            CacheLookup::Miss | CacheLookup::Expired => None
        }
    }
}

/// Record the failure and ask the strategy for replacement text.
fn substitute(
    failures: &FailureLog,
    mock: &dyn MockStrategy,
    options: &FallbackConfig,
    request: &CompletionRequest,
    error: &RelayError
) -> Option<String> {
    if options.log_failures {
        failures.record(&request.prompt, error);
    }

    let text = if options.use_mock_data {
        mock.synthesize(request)
    } else {
        None
    };

    match text {
        Some(text) => {
            info!(prompt = %utils::prompt_fingerprint(&request.prompt), "Using mock data");
            RelayTelemetry::record_fallback("mock");
            Some(text)
        }
        None => {
            RelayTelemetry::record_fallback("rethrow");
            None
        }
    }
}

/// Emit `word + " "` per whitespace-separated word, pausing between words.
fn word_stream(text: String, delay: Duration) -> TextStream {
    let words: Vec<String> = text.split_whitespace().map(|w| format!("{w} ")).collect();
    Box::pin(async_stream::stream! {
        for (index, word) in words.into_iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            yield Ok(word);
        }
    })
}

fn streamed_response(request: &CompletionRequest, text: String) -> CompletionResponse {
    CompletionResponse {
        id: utils::generate_id("cmpl"),
        text,
        model: request
            .model
            .clone()
            .unwrap_or_else(|| utils::DEFAULT_MODEL_KEY.to_string()),
        usage: None,
        timestamp: Utc::now()
    }
}

#[async_trait]
impl CompletionBackend for FallbackWrapper {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.generate(request).await
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream> {
        FallbackWrapper::stream(self, request).await
    }
}
