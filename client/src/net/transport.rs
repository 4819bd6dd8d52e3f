//! Request/response transport to the REST backend.
//!
//! DESIGN
//! ======
//! `Transport` is the only place that performs I/O. `ApiClient` layers the
//! bearer-token and 401 rules on top, and tests swap in a scripted transport.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::Duration;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use super::error::ApiError;
use crate::config::ClientConfig;

/// A backend call before authentication headers are resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Bearer token; `ApiClient` fills it from persisted storage when unset.
    pub bearer: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, bearer: None }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Raw backend answer: HTTP status plus the decoded body.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async transport seam. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response was received. HTTP
    /// error statuses are not errors at this layer.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

// =============================================================================
// HTTP
// =============================================================================

/// `reqwest`-backed transport with a fixed overall request timeout.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = endpoint_url(&self.base_url, &request.path);
        let mut builder = self
            .http
            .request(request.method, &url)
            .header(CONTENT_TYPE, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        Ok(ApiResponse { status, body: decode_body(&text) })
    }
}

/// Percent-encode `raw` as one path segment, so ids holding `/`, `?` or `#`
/// cannot escape into another route.
#[must_use]
pub fn path_segment(raw: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
        return raw.to_owned();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(raw);
    }
    url.path().trim_start_matches('/').to_owned()
}

pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Empty bodies decode as `null`, non-JSON bodies as a JSON string.
pub(crate) fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Transport("request timed out".to_owned())
    } else {
        ApiError::Transport(error.to_string())
    }
}
