/*!
 * Network collaborators of the catalog pipeline.
 *
 * Every request to the catalog service goes through the [`Transport`] trait so
 * the pipeline can be driven by a real HTTP client or by a scripted fake:
 * - `http`: reqwest client with bounded retry and backoff
 * - `mock`: canned responses for tests
 *
 * A [`RequestContext`] travels with every call. It carries the caller's
 * cancellation token and an optional deadline, and it is also used for every
 * sleep between requests so nothing outlives an aborted search.
 */

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;

/// Common trait for all catalog transports
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Fetch a page with GET
    ///
    /// # Arguments
    /// * `url` - Absolute URL
    /// * `ctx` - Cancellation and deadline of the surrounding request
    async fn get(&self, url: &str, ctx: &RequestContext) -> Result<String, ProviderError>;

    /// Submit a form-encoded POST
    ///
    /// # Arguments
    /// * `url` - Absolute URL
    /// * `form` - Field name/value pairs, in order
    /// * `ctx` - Cancellation and deadline of the surrounding request
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        ctx: &RequestContext,
    ) -> Result<String, ProviderError>;
}

/// Cancellation token and deadline shared by all calls of one search or download
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context without a deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an existing token
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    /// Add a deadline `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Token observed by this context
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Abort everything running under this context
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail fast when the context is already cancelled or expired
    pub fn check(&self) -> Result<(), ProviderError> {
        if self.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ProviderError::Timeout("request deadline exceeded".to_string()));
            }
        }
        Ok(())
    }

    /// Drive `fut` until it completes, the token fires or the deadline passes
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = self.token.cancelled() => Err(ProviderError::Cancelled),
            _ = deadline => Err(ProviderError::Timeout("request deadline exceeded".to_string())),
        }
    }

    /// Sleep for `duration` unless the context ends first
    pub async fn sleep(&self, duration: Duration) -> Result<(), ProviderError> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

pub mod http;
pub mod mock;
