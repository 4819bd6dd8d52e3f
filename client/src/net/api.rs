//! Typed REST API client.
//!
//! Every request reads the bearer token from persisted storage at request
//! time, never from in-memory store state. Every 401 response removes the
//! persisted session as a side effect, whichever store issued the call, so
//! no later request can go out looking authenticated. The rejected bearer is
//! published on [`ApiClient::rejections`] so the session store can drop its
//! in-memory copy as well.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become [`ApiError`] variants carrying the backend
//! `message`. Success bodies are unwrapped from the `{ data: … }` envelope.

#[path = "api_admin.rs"]
mod api_admin;
#[path = "api_auth.rs"]
mod api_auth;
#[path = "api_breeds.rs"]
mod api_breeds;
#[path = "api_posts.rs"]
mod api_posts;

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use super::error::ApiError;
use super::transport::{ApiRequest, HttpTransport, Transport};
use crate::config::ClientConfig;
use crate::storage::{self, SessionStorage};

/// Cheaply cloneable handle shared by every store.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn SessionStorage>,
    rejected: Arc<watch::Sender<Option<String>>>,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn SessionStorage>) -> Self {
        let (rejected, _rx) = watch::channel(None);
        Self { transport, storage, rejected: Arc::new(rejected) }
    }

    /// Build a client over [`HttpTransport`] for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), storage))
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// The last bearer token the backend answered with 401, if any.
    #[must_use]
    pub fn rejected_token(&self) -> Option<String> {
        self.rejected.borrow().clone()
    }

    /// Receiver that wakes whenever a bearer token is rejected.
    #[must_use]
    pub fn rejections(&self) -> watch::Receiver<Option<String>> {
        self.rejected.subscribe()
    }

    /// Forget a rejection of `token` once the backend has issued it afresh.
    pub(crate) fn accept_token(&self, token: &str) {
        self.rejected.send_if_modified(|rejected| {
            if rejected.as_deref() == Some(token) {
                *rejected = None;
                true
            } else {
                false
            }
        });
    }

    /// Send a request and return the raw success body.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or the classified status error for any
    /// non-2xx response.
    pub async fn send(&self, mut request: ApiRequest) -> Result<Value, ApiError> {
        if request.bearer.is_none() {
            request.bearer = storage::stored_token(self.storage.as_ref());
        }
        let method = request.method.clone();
        let path = request.path.clone();
        let bearer = request.bearer.clone();
        tracing::debug!(%method, %path, authenticated = request.bearer.is_some(), "api request");

        let response = self.transport.execute(request).await?;
        if response.status == 401 {
            tracing::warn!(%method, %path, "backend rejected credential; clearing persisted session");
            if let Err(e) = storage::clear_session(self.storage.as_ref()) {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
            if let Some(token) = bearer {
                self.rejected.send_replace(Some(token));
            }
        }
        if !response.is_success() {
            tracing::debug!(%method, %path, status = response.status, "api request failed");
            return Err(ApiError::from_status(response.status, &response.body));
        }
        Ok(response.body)
    }

    /// Send a request and decode `data.<field>` (or `<field>` at the root).
    pub(crate) async fn send_for<T: DeserializeOwned>(&self, request: ApiRequest, field: &str) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        extract_field(body, field)
    }

    /// Send a request and decode the whole `data` object.
    pub(crate) async fn send_for_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        decode(unwrap_data(body))
    }
}

/// Strip the `{ data: … }` envelope when present.
pub(crate) fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Pull `field` out of the `data` envelope, falling back to the root object
/// for endpoints that answer without the envelope.
pub(crate) fn extract_field<T: DeserializeOwned>(body: Value, field: &str) -> Result<T, ApiError> {
    let mut root = body;
    if let Some(Value::Object(data)) = root.get_mut("data") {
        if let Some(value) = data.remove(field) {
            return decode(value);
        }
    }
    match root.get_mut(field) {
        Some(value) => decode(value.take()),
        None => Err(ApiError::Parse(format!("missing field `{field}` in response"))),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}
