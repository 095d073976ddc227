/*!
 * Scripted transport for testing.
 *
 * Responses are registered per route (HTTP method, URL prefix and an optional
 * form field that must match). A route can hold several responses, served in
 * order; the last one repeats. Every request is recorded so tests can assert on
 * what was sent:
 * - `MockTransport::new().on_get(...)` - canned page
 * - `MockTransport::new().on_post_field(...)` - canned form reply
 * - `MockTransport::failing(...)` - every request fails
 * - `with_delay(...)` - simulate a slow service
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{RequestContext, Transport};

/// HTTP method of a recorded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMethod {
    Get,
    Post,
}

/// A request seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: MockMethod,
    pub url: String,
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a form field, if it was sent
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
struct Route {
    method: MockMethod,
    url_prefix: String,
    field: Option<(String, String)>,
    responses: Vec<Result<String, ProviderError>>,
    served: usize,
}

impl Route {
    fn matches(&self, method: MockMethod, url: &str, form: &[(String, String)]) -> bool {
        if self.method != method || !url.starts_with(&self.url_prefix) {
            return false;
        }
        match &self.field {
            Some((name, value)) => form.iter().any(|(k, v)| k == name && v == value),
            None => true,
        }
    }

    fn next_response(&mut self) -> Result<String, ProviderError> {
        let index = self.served.min(self.responses.len().saturating_sub(1));
        self.served += 1;
        self.responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::ParseError("route has no response".to_string())))
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes: Vec<Route>,
    requests: Vec<RecordedRequest>,
}

/// Mock transport for testing the catalog pipeline
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    fallback: Option<ProviderError>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Transport with no routes; unmatched requests answer 404
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose unmatched requests all fail with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self {
            fallback: Some(error),
            ..Self::default()
        }
    }

    /// Delay every response
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn add_route(
        self,
        method: MockMethod,
        url_prefix: &str,
        field: Option<(&str, &str)>,
        responses: Vec<Result<String, ProviderError>>,
    ) -> Self {
        self.state.lock().routes.push(Route {
            method,
            url_prefix: url_prefix.to_string(),
            field: field.map(|(k, v)| (k.to_string(), v.to_string())),
            responses,
            served: 0,
        });
        self
    }

    /// Answer GET requests under `url_prefix`
    pub fn on_get(self, url_prefix: &str, body: impl Into<String>) -> Self {
        self.add_route(MockMethod::Get, url_prefix, None, vec![Ok(body.into())])
    }

    /// Answer GET requests under `url_prefix` with a sequence of results
    pub fn on_get_sequence(self, url_prefix: &str, responses: Vec<Result<String, ProviderError>>) -> Self {
        self.add_route(MockMethod::Get, url_prefix, None, responses)
    }

    /// Answer POST requests under `url_prefix`
    pub fn on_post(self, url_prefix: &str, body: impl Into<String>) -> Self {
        self.add_route(MockMethod::Post, url_prefix, None, vec![Ok(body.into())])
    }

    /// Answer POST requests under `url_prefix` carrying `field=value`
    pub fn on_post_field(self, url_prefix: &str, field: &str, value: &str, body: impl Into<String>) -> Self {
        self.add_route(MockMethod::Post, url_prefix, Some((field, value)), vec![Ok(body.into())])
    }

    /// Answer POST requests carrying `field=value` with a sequence of results
    pub fn on_post_field_sequence(
        self,
        url_prefix: &str,
        field: &str,
        value: &str,
        responses: Vec<Result<String, ProviderError>>,
    ) -> Self {
        self.add_route(MockMethod::Post, url_prefix, Some((field, value)), responses)
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    fn respond(&self, method: MockMethod, url: &str, form: &[(String, String)]) -> Result<String, ProviderError> {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method,
            url: url.to_string(),
            form: form.to_vec(),
        });

        // Field-specific routes win over catch-all routes
        let position = state
            .routes
            .iter()
            .position(|r| r.field.is_some() && r.matches(method, url, form))
            .or_else(|| state.routes.iter().position(|r| r.matches(method, url, form)));

        match position {
            Some(i) => state.routes[i].next_response(),
            None => Err(self.fallback.clone().unwrap_or_else(|| ProviderError::ApiError {
                status_code: 404,
                message: format!("no mock route for {}", url),
            })),
        }
    }

    async fn handle(
        &self,
        method: MockMethod,
        url: &str,
        form: &[(String, String)],
        ctx: &RequestContext,
    ) -> Result<String, ProviderError> {
        ctx.check()?;
        let response = self.respond(method, url, form);
        if let Some(delay) = self.delay {
            ctx.sleep(delay).await?;
        }
        response
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, ctx: &RequestContext) -> Result<String, ProviderError> {
        self.handle(MockMethod::Get, url, &[], ctx).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        ctx: &RequestContext,
    ) -> Result<String, ProviderError> {
        self.handle(MockMethod::Post, url, form, ctx).await
    }
}
