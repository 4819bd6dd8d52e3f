//! Client state stores.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each store owns one [`store::Store`] cell and a defined action contract.
//! Stores are created once per [`AppState`] and injected into front ends;
//! there is no ambient global state.
//!
//! ERROR HANDLING
//! ==============
//! Actions never surface [`ApiError`] directly. They record a human-readable
//! message in their state and return it as an [`ActionError`].

pub mod breeds;
pub mod favorites;
pub mod notifications;
pub mod posts;
pub mod session;
pub mod store;
pub mod users;


use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::storage::SessionStorage;
use crate::util::validation::FormErrors;

use self::breeds::BreedsStore;
use self::favorites::FavoritesStore;
use self::notifications::NotificationCenter;
use self::posts::PostsStore;
use self::session::SessionStore;
use self::users::UsersStore;

/// Failure of a store action, already reduced to user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The backend refused or could not be reached.
    #[error("{0}")]
    Rejected(String),
    /// The backend rejected the credential; the caller should prompt for sign-in.
    #[error("{0}")]
    Unauthorized(String),
    /// The action is not allowed for the acting user.
    #[error("{0}")]
    Forbidden(String),
    /// Local form checks failed; nothing was sent.
    #[error("{}", .0.summary())]
    Invalid(FormErrors),
}

impl ActionError {
    /// Reduce an API failure to its message, or `default` when the backend
    /// sent none.
    #[must_use]
    pub fn from_api(error: &ApiError, default: &str) -> Self {
        let message = error.message_or(default);
        if error.is_unauthorized() { Self::Unauthorized(message) } else { Self::Rejected(message) }
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type ActionResult<T = ()> = Result<T, ActionError>;

/// Every store wired to one API client.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub session: SessionStore,
    pub favorites: FavoritesStore,
    pub breeds: BreedsStore,
    pub posts: PostsStore,
    pub users: UsersStore,
    pub notifications: NotificationCenter,
}

impl AppState {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            session: SessionStore::new(api.clone()),
            favorites: FavoritesStore::new(api.clone()),
            breeds: BreedsStore::new(api.clone()),
            posts: PostsStore::new(api.clone()),
            users: UsersStore::new(api.clone()),
            notifications: NotificationCenter::new(),
            api,
        }
    }

    /// Build the HTTP-backed state for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        Ok(Self::new(ApiClient::from_config(config, storage)?))
    }

    /// Restore and revalidate the persisted session.
    pub async fn start(&self) {
        self.session.rehydrate().await;
    }

    /// Sign out locally and drop session-scoped data.
    pub fn logout(&self) -> Option<tokio::task::JoinHandle<()>> {
        self.favorites.reset();
        self.users.reset();
        self.session.logout()
    }
}
