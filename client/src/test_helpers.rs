//! Shared fixtures for unit tests: a scripted transport and session seeding.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Method;
use serde_json::{Value, json};

use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::net::transport::{ApiRequest, ApiResponse, Transport};
use crate::net::types::{Role, User};
use crate::storage::{self, MemoryStorage, PersistedSession, SessionStorage};

enum Scripted {
    Reply { status: u16, body: Value, delay: Option<Duration> },
    Fail(String),
}

/// Transport answering from per-route reply queues and recording every call.
/// Unscripted routes answer 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn route_key(method: &Method, path: &str) -> String {
    format!("{} {path}", method.as_str())
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.replies
            .lock()
            .unwrap()
            .entry(route_key(&method, path))
            .or_default()
            .push_back(scripted);
    }

    pub(crate) fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Scripted::Reply { status, body, delay: None });
    }

    pub(crate) fn reply_after(&self, method: Method, path: &str, status: u16, body: Value, delay: Duration) {
        self.push(method, path, Scripted::Reply { status, body, delay: Some(delay) });
    }

    pub(crate) fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(method, path, Scripted::Fail(message.to_owned()));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded calls as `"METHOD /path"` strings, in issue order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| route_key(&r.method, &r.path))
            .collect()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let key = route_key(&request.method, &request.path);
        self.requests.lock().unwrap().push(request);
        let scripted = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(Scripted::Reply { status, body, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(ApiResponse::new(status, body))
            }
            Some(Scripted::Fail(message)) => Err(ApiError::Transport(message)),
            None => Ok(ApiResponse::new(404, json!({ "message": format!("no scripted reply for {key}") }))),
        }
    }
}

pub(crate) fn mock_client() -> (ApiClient, Arc<MockTransport>, Arc<MemoryStorage>) {
    let transport = MockTransport::new();
    let storage = Arc::new(MemoryStorage::new());
    let client = ApiClient::new(transport.clone(), storage.clone());
    (client, transport, storage)
}

pub(crate) fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_owned(),
        first_name: "Test".to_owned(),
        last_name: "User".to_owned(),
        email: format!("{id}@example.test"),
        role,
        ..User::default()
    }
}

/// Persist an authenticated session the way a previous run would have.
pub(crate) fn seed_session(storage: &dyn SessionStorage, user: User, token: &str) {
    storage::save_session(
        storage,
        &PersistedSession { user: Some(user), token: Some(token.to_owned()), is_authenticated: true },
    )
    .unwrap();
}

pub(crate) fn data(value: Value) -> Value {
    json!({ "data": value })
}
