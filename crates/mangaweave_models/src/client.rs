//! OpenAI-compatible chat completions client for xAI.

use crate::conversion::{from_chat_response, to_chat_request};
use crate::dto::{ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use mangaweave_core::{GenerateRequest, GenerateResponse};
use mangaweave_error::{MangaweaveResult, ModelsError, ModelsErrorKind};
use mangaweave_interface::MangaweaveDriver;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, instrument, warn};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Backoff applied to transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Base delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound on a single delay
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_delay_secs: 30,
        }
    }
}

/// xAI chat completions client.
///
/// Cloning shares the HTTP connection pool and the rate limiter.
#[derive(Clone)]
pub struct XaiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryPolicy,
    limiter: Option<Arc<DirectLimiter>>,
}

impl std::fmt::Debug for XaiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XaiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

impl XaiClient {
    /// Create a client with an explicit API key.
    ///
    /// # Errors
    ///
    /// `ModelsErrorKind::ClientCreation` if the HTTP client cannot be built.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref(), model = %model.as_ref()))]
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl AsRef<str>,
        model: impl AsRef<str>,
    ) -> MangaweaveResult<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| ModelsError::new(ModelsErrorKind::ClientCreation(e.to_string())))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            model: model.as_ref().to_string(),
            retry: RetryPolicy::default(),
            limiter: None,
        })
    }

    /// Create a client reading the API key from `env_var`.
    ///
    /// # Errors
    ///
    /// `ModelsErrorKind::MissingApiKey` when the variable is unset or empty.
    pub fn from_env(
        env_var: &str,
        base_url: impl AsRef<str>,
        model: impl AsRef<str>,
    ) -> MangaweaveResult<Self> {
        let api_key = std::env::var(env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ModelsError::new(ModelsErrorKind::MissingApiKey(env_var.to_string())))?;
        Self::new(api_key, base_url, model)
    }

    /// Throttle to `rpm` requests per minute; `None` or zero disables throttling.
    pub fn with_requests_per_minute(mut self, rpm: Option<u32>) -> Self {
        self.limiter = rpm
            .and_then(NonZeroU32::new)
            .map(|n| Arc::new(RateLimiter::direct(Quota::per_minute(n))));
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, (ModelsError, Option<Duration>)> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| (ModelsError::new(ModelsErrorKind::Transport(e.to_string())), None))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
                response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
            } else {
                None
            };
            let message = response.text().await.unwrap_or_default();
            return Err((
                ModelsError::new(ModelsErrorKind::HttpStatus {
                    status_code: status.as_u16(),
                    message,
                }),
                retry_after,
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| (ModelsError::new(ModelsErrorKind::Transport(e.to_string())), None))?;
        serde_json::from_str(&text).map_err(|e| {
            (
                ModelsError::new(ModelsErrorKind::MalformedResponse(e.to_string())),
                None,
            )
        })
    }
}

#[async_trait]
impl MangaweaveDriver for XaiClient {
    #[instrument(skip(self, req), fields(provider = "xai", model = %self.model, images = req.image_count()))]
    async fn generate(&self, req: &GenerateRequest) -> MangaweaveResult<GenerateResponse> {
        let body = to_chat_request(req, &self.model)?;

        let strategy = ExponentialBackoff::from_millis(self.retry.initial_backoff_ms)
            .factor(2)
            .max_delay(Duration::from_secs(self.retry.max_delay_secs))
            .map(jitter)
            .take(self.retry.max_retries);

        let client = self;
        let body = &body;
        let response = Retry::spawn(strategy, move || async move {
            match client.send_once(body).await {
                Ok(response) => Ok(response),
                Err((e, retry_after)) if e.kind.is_retryable() => {
                    warn!(error = %e, "Transient provider error, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after,
                    })
                }
                Err((e, _)) => {
                    warn!(error = %e, "Permanent provider error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await?;

        let response = from_chat_response(response)?;
        debug!(chars = response.text().len(), "Received completion");
        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        "xai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
