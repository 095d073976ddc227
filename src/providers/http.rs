use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use rand::Rng;
use reqwest::{Client, RequestBuilder};

use crate::app_config::CatalogConfig;
use crate::errors::ProviderError;
use crate::providers::{RequestContext, Transport};

/// Longest part of a response body quoted in an error
const ERROR_EXCERPT_CHARS: usize = 200;

/// reqwest based transport for the catalog service
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client, shared by all requests
    client: Client,
    /// Retries after the first attempt
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl HttpTransport {
    /// Create a transport with explicit settings
    pub fn new(user_agent: &str, timeout: Duration, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            client: Client::builder()
                .user_agent(user_agent)
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    /// Create a transport from the catalog configuration
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
            config.retry_count,
            config.retry_backoff_ms,
        )
    }

    /// Exponential backoff with up to 25% jitter
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
        let jitter = if base >= 4 { rand::rng().random_range(0..=base / 4) } else { 0 };
        Duration::from_millis(base + jitter)
    }

    /// Send one attempt and read the body
    async fn send_once(request: RequestBuilder) -> Result<String, ProviderError> {
        let response = request.send().await.map_err(Self::map_reqwest_error)?;
        let status = response.status();

        if status.is_success() {
            return response.text().await.map_err(|e| {
                ProviderError::ParseError(format!("Failed to read response body: {}", e))
            });
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        Err(ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body.chars().take(ERROR_EXCERPT_CHARS).collect(),
        })
    }

    fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else if e.is_connect() {
            ProviderError::ConnectionError(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }

    /// Run a request with retry logic
    async fn execute<F>(&self, url: &str, ctx: &RequestContext, build: F) -> Result<String, ProviderError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;

        loop {
            match ctx.run(Self::send_once(build())).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Catalog request to {} failed: {} - attempt {}/{}",
                        url,
                        e,
                        attempt,
                        self.max_retries + 1
                    );
                    ctx.sleep(self.backoff_delay(attempt)).await?;
                }
                Err(e) => {
                    if !matches!(e, ProviderError::Cancelled) {
                        error!("Catalog request to {} failed: {}", url, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, ctx: &RequestContext) -> Result<String, ProviderError> {
        self.execute(url, ctx, || self.client.get(url)).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        ctx: &RequestContext,
    ) -> Result<String, ProviderError> {
        self.execute(url, ctx, || self.client.post(url).form(form)).await
    }
}
