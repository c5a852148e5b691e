//! HTTP client for the upstream completion endpoint.

use std::time::Duration;

use async_trait::async_trait;
use config::{ConnectionConfig, ConnectionConfigPatch};
use errors::{RelayError, Result};
use futures_util::StreamExt;
use observability::{RelayTelemetry, RequestTimer};
use parking_lot::{Mutex, RwLock};
use relay_core::{CompletionBackend, CompletionRequest, CompletionResponse, TextStream};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::health::HealthCache;
use crate::retry::RetryPolicy;
use crate::sse::SseDecoder;
use crate::wire::{RawCompletion, WireRequest};

const COMPONENT: &str = "connection";

/// Connection manager for the upstream completion service.
///
/// Configuration can be swapped at runtime through
/// [`ConnectionManager::update_config`]; calls already in flight keep the
/// snapshot they started with.
pub struct ConnectionManager {
    config: RwLock<ConnectionConfig>,
    http: Client,
    health: Mutex<HealthCache>
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| RelayError::configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            config: RwLock::new(config),
            http,
            health: Mutex::new(HealthCache::default())
        })
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ConnectionConfig {
        self.config.read().clone()
    }

    /// Merge a partial update; affects subsequent calls only.
    pub fn update_config(&self, patch: ConnectionConfigPatch) {
        let url_changed = self.config.write().apply(patch);
        if url_changed {
            self.health.lock().invalidate();
        }
        info!(url_changed, "Connection configuration updated");
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Probe the upstream health endpoint. Any 2xx is healthy.
    ///
    /// Results are reused for `health_cache_ttl_ms`. The probe has its own
    /// `health_timeout_ms` deadline. Never fails: an error building the
    /// probe returns the last known status.
    pub async fn health_check(&self) -> bool {
        let (url, ttl, timeout) = {
            let config = self.config.read();
            (
                config.endpoint(&config.health_path),
                Duration::from_millis(config.health_cache_ttl_ms),
                Duration::from_millis(config.health_timeout_ms)
            )
        };

        if let Some(healthy) = self.health.lock().fresh(ttl) {
            debug!(healthy, "Using cached upstream health status");
            return healthy;
        }

        let healthy = match self.http.get(&url).timeout(timeout).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("Upstream health check failed: {}", resp.status());
                false
            }
            Err(e) if e.is_builder() => {
                warn!("Upstream health check could not be sent: {}", e);
                return self.health.lock().last_known();
            }
            Err(e) => {
                warn!("Upstream health check error: {}", e);
                false
            }
        };

        self.health.lock().record(healthy);
        healthy
    }

    // ========================================================================
    // Completions
    // ========================================================================

    /// Perform a completion with bounded retries.
    ///
    /// Upstream status errors, network errors and timeouts are retried;
    /// exhaustion returns [`RelayError::Connection`] wrapping the last error.
    pub async fn request(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let config = self.config();
        let policy = RetryPolicy::from_config(&config);
        let fingerprint = utils::prompt_fingerprint(&request.prompt);

        if !self.health_check().await {
            warn!(prompt = %fingerprint, "Upstream reported unhealthy, attempting anyway");
        }

        let timer = RequestTimer::new(COMPONENT);
        let mut attempt = 0;
        loop {
            match self.complete_once(&config, request).await {
                Ok(response) => {
                    debug!(prompt = %fingerprint, attempt = attempt + 1, id = %response.id, "Completion succeeded");
                    RelayTelemetry::record_request(COMPONENT, "success");
                    timer.finish();
                    return Ok(response);
                }
                Err(e) if !e.is_retryable() => {
                    error!(prompt = %fingerprint, "Completion failed without retry: {}", e);
                    RelayTelemetry::record_request(COMPONENT, "failure");
                    return Err(e);
                }
                Err(e) => match policy.delay_for(attempt) {
                    Some(delay) => {
                        warn!(
                            "Transient error (attempt {}/{}): {}",
                            attempt + 1,
                            policy.max_attempts(),
                            e
                        );
                        RelayTelemetry::record_retry(COMPONENT);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        error!(prompt = %fingerprint, attempts = attempt + 1, "Completion retries exhausted: {}", e);
                        RelayTelemetry::record_request(COMPONENT, "failure");
                        return Err(RelayError::Connection {
                            attempts: attempt + 1,
                            last: Box::new(e)
                        });
                    }
                }
            }
        }
    }

    /// Open a streaming completion. Single attempt, no retries.
    ///
    /// The returned stream ends when the body closes; a transport failure
    /// mid-body yields one error and ends it.
    pub async fn stream(&self, request: &CompletionRequest) -> Result<TextStream> {
        let config = self.config();
        let timeout = Duration::from_millis(config.timeout_ms);

        let response = match self.send(&config, request, true).await {
            Ok(response) => response,
            Err(e) => {
                warn!(prompt = %utils::prompt_fingerprint(&request.prompt), "Failed to open completion stream: {}", e);
                RelayTelemetry::record_request(COMPONENT, "failure");
                return Err(e);
            }
        };
        RelayTelemetry::record_request(COMPONENT, "success");

        let body = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut failed = false;
            futures_util::pin_mut!(body);

            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for text in decoder.push(&bytes) {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        warn!("Completion stream interrupted: {}", e);
                        failed = true;
                        yield Err(if e.is_timeout() {
                            RelayError::Timeout {
                                timeout_ms: timeout.as_millis() as u64
                            }
                        } else {
                            RelayError::Stream {
                                reason: e.to_string()
                            }
                        });
                        break;
                    }
                }
            }

            if !failed {
                if let Some(text) = decoder.finish() {
                    yield Ok(text);
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn complete_once(
        &self,
        config: &ConnectionConfig,
        request: &CompletionRequest
    ) -> Result<CompletionResponse> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let response = self.send(config, request, false).await?;

        let raw: RawCompletion = response
            .json()
            .await
            .map_err(|e| RelayError::from_reqwest(e, timeout))?;

        raw.into_response(Self::model_for(config, request))
    }

    async fn send(
        &self,
        config: &ConnectionConfig,
        request: &CompletionRequest,
        stream: bool
    ) -> Result<reqwest::Response> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let body = WireRequest::new(request, Self::model_for(config, request), stream);

        let mut builder = self
            .http
            .post(config.endpoint(&config.completions_path))
            .timeout(timeout)
            .json(&body);
        if let Some(api_key) = &config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RelayError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body
            });
        }

        Ok(response)
    }

    fn model_for<'a>(config: &'a ConnectionConfig, request: &'a CompletionRequest) -> &'a str {
        request.model.as_deref().unwrap_or(&config.default_model)
    }
}

#[async_trait]
impl CompletionBackend for ConnectionManager {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.request(request).await
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream> {
        ConnectionManager::stream(self, request).await
    }
}
