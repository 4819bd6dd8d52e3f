//! Authentication session: who is signed in and the credential proving it.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards (`util::auth`) and every user-aware view read this state.
//! The persisted subset (`user`, `token`, `is_authenticated`) is written to
//! `storage` after each change and restored by [`SessionStore::rehydrate`].
//!
//! TRADE-OFFS
//! ==========
//! A restored token is never trusted on its own: rehydration keeps
//! `is_loading` set until the backend has answered a profile request. A
//! non-401 failure of that request keeps the stale session rather than
//! logging the user out on a transient error.
//!
//! A 401 answered to any store rejects the token held here too: the store
//! follows [`ApiClient::rejections`] and never persists a rejected token.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::store::Store;
use super::{ActionError, ActionResult};
use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::net::types::{AuthPayload, Credentials, ProfileUpdate, RegisterRequest, User, UserPatch};
use crate::storage::{self, PersistedSession};

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";
const SESSION_EXPIRED: &str = "Session expired, please sign in again";
const PROFILE_UNAVAILABLE: &str = "Unable to load profile";
const PROFILE_UPDATE_FAILED: &str = "Unable to update profile";
const NOT_SIGNED_IN: &str = "Not signed in";

/// Session state. Starts loading until rehydration settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { user: None, token: None, is_authenticated: false, is_loading: true, error: None }
    }
}

impl SessionState {
    /// The subset that survives restarts.
    #[must_use]
    pub fn persisted(&self) -> PersistedSession {
        PersistedSession {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated,
        }
    }

    /// Signed in, verified and settled.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_authenticated && !self.is_loading && self.user.is_some() && self.token.is_some()
    }

    fn clear_credentials(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
    }
}

#[derive(Clone)]
pub struct SessionStore {
    state: Store<SessionState>,
    api: ApiClient,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let state = Store::default();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(follow_rejections(state.clone(), api.rejections()));
        }
        Self { state, api }
    }

    #[must_use]
    pub fn state(&self) -> &Store<SessionState> {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.drop_rejected();
        self.state.get()
    }

    /// Sign out locally if the held token is the one the backend last
    /// rejected.
    fn drop_rejected(&self) {
        if let Some(rejected) = self.api.rejected_token() {
            clear_if_held(&self.state, &rejected);
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the backend message (or "Login failed") and records it in
    /// `error`; the session stays signed out.
    pub async fn login(&self, email: &str, password: &str) -> ActionResult {
        self.begin_auth();
        let credentials = Credentials { email: email.trim().to_owned(), password: password.to_owned() };
        let result = self.api.login(&credentials).await;
        self.finish_auth(result, LOGIN_FAILED)
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns the backend message (or "Registration failed") and records it
    /// in `error`.
    pub async fn register(&self, request: &RegisterRequest) -> ActionResult {
        self.begin_auth();
        let result = self.api.signup(request).await;
        self.finish_auth(result, REGISTER_FAILED)
    }

    fn begin_auth(&self) {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish_auth(&self, result: Result<AuthPayload, ApiError>, default: &str) -> ActionResult {
        match result {
            Ok(AuthPayload { user, token }) => {
                tracing::info!(user_id = %user.id, role = %user.role, "signed in");
                self.api.accept_token(&token);
                self.state.update(|s| {
                    s.user = Some(user);
                    s.token = Some(token);
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
                self.persist();
                Ok(())
            }
            Err(e) => {
                let error = ActionError::from_api(&e, default);
                tracing::debug!(error = %e, "authentication failed");
                self.state.update(|s| {
                    s.is_loading = false;
                    s.error = Some(error.message());
                });
                Err(error)
            }
        }
    }

    /// Revalidate the held token and refresh the user record.
    ///
    /// Without a token this returns immediately, ends loading and sends
    /// nothing.
    ///
    /// # Errors
    ///
    /// [`ActionError::Unauthorized`] when there is no token or the backend
    /// rejected it (the session is then cleared), [`ActionError::Rejected`]
    /// for any other failure (the session is kept).
    pub async fn fetch_profile(&self) -> ActionResult {
        let Some(token) = self.state.with(|s| s.token.clone()) else {
            self.state.update(|s| s.is_loading = false);
            return Err(ActionError::Unauthorized(NOT_SIGNED_IN.to_owned()));
        };

        self.state.update(|s| s.is_loading = true);
        match self.api.profile().await {
            Ok(user) => {
                let mut applied = false;
                self.state.update(|s| {
                    if s.token.as_deref() == Some(token.as_str()) {
                        s.user = Some(user);
                        s.is_authenticated = true;
                        applied = true;
                    }
                    s.is_loading = false;
                });
                if applied {
                    self.persist();
                }
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                let mut cleared = false;
                self.state.update(|s| {
                    if s.token.as_deref() == Some(token.as_str()) {
                        s.clear_credentials();
                        cleared = true;
                    }
                    s.is_loading = false;
                });
                if cleared {
                    tracing::warn!("persisted session rejected by backend; signed out");
                }
                // Either clears the copy or restores a session that replaced
                // the rejected one while the request was in flight.
                self.persist();
                Err(ActionError::from_api(&e, SESSION_EXPIRED))
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile revalidation failed; keeping session");
                self.state.update(|s| s.is_loading = false);
                Err(ActionError::from_api(&e, PROFILE_UNAVAILABLE))
            }
        }
    }

    /// Clear the session locally, then tell the backend as a best-effort
    /// background task.
    ///
    /// Local state and the persisted copy are cleared before this returns,
    /// whatever the backend later answers. The returned handle resolves when
    /// the backend call settles; `None` means no call was issued.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let token = self.state.with(|s| s.token.clone());
        self.state.update(|s| {
            s.clear_credentials();
            s.error = None;
        });
        self.persist();
        tracing::info!("signed out");

        let token = token?;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no async runtime; skipping backend logout");
            return None;
        };
        let api = self.api.clone();
        Some(runtime.spawn(async move {
            if let Err(e) = api.logout(&token).await {
                tracing::debug!(error = %e, "backend logout failed; local session already cleared");
            }
        }))
    }

    /// Merge `patch` into the current user. No-op when signed out.
    pub fn update_user(&self, patch: &UserPatch) {
        let mut changed = false;
        self.state.update(|s| {
            if let Some(user) = s.user.as_mut() {
                patch.apply_to(user);
                changed = true;
            }
        });
        if changed {
            self.persist();
        }
    }

    /// Save editable profile fields and merge the backend's answer.
    ///
    /// # Errors
    ///
    /// Returns the backend message or "Unable to update profile".
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ActionResult<User> {
        match self.api.update_profile(update).await {
            Ok(user) => {
                self.update_user(&UserPatch::from(user.clone()));
                Ok(user)
            }
            Err(e) => Err(ActionError::from_api(&e, PROFILE_UPDATE_FAILED)),
        }
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    /// Restore the persisted session and revalidate it before trusting it.
    ///
    /// A restored session that claims to be authenticated and holds a token
    /// triggers [`Self::fetch_profile`]; anything else just ends loading. A
    /// persisted entry without a token is discarded.
    pub async fn rehydrate(&self) {
        let storage = self.api.storage();
        match storage::load_session(storage.as_ref()) {
            Some(persisted) if persisted.token.as_deref().is_some_and(|t| !t.is_empty()) => {
                self.state.update(|s| {
                    s.user = persisted.user;
                    s.token = persisted.token;
                    s.is_authenticated = persisted.is_authenticated;
                });
            }
            Some(_) => {
                tracing::debug!("discarding persisted session without a token");
                if let Err(e) = storage::clear_session(storage.as_ref()) {
                    tracing::warn!(error = %e, "failed to clear persisted session");
                }
            }
            None => {}
        }

        let needs_check = self.state.with(|s| s.is_authenticated && s.token.is_some());
        if needs_check {
            if let Err(e) = self.fetch_profile().await {
                tracing::debug!(error = %e, "restored session not confirmed");
            }
        } else {
            self.state.update(|s| s.is_loading = false);
        }
    }

    fn persist(&self) {
        self.drop_rejected();
        let persisted = self.state.with(SessionState::persisted);
        let storage = self.api.storage();
        let result = if persisted.token.is_some() {
            storage::save_session(storage.as_ref(), &persisted)
        } else {
            storage::clear_session(storage.as_ref())
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }
}

fn clear_if_held(state: &Store<SessionState>, rejected: &str) {
    if !state.with(|s| s.token.as_deref() == Some(rejected)) {
        return;
    }
    state.update(|s| {
        s.clear_credentials();
        s.is_loading = false;
    });
    tracing::warn!("credential rejected by backend; signed out");
}

async fn follow_rejections(state: Store<SessionState>, mut rejections: watch::Receiver<Option<String>>) {
    while rejections.changed().await.is_ok() {
        let rejected = rejections.borrow_and_update().clone();
        if let Some(rejected) = rejected {
            clear_if_held(&state, &rejected);
        }
    }
}
