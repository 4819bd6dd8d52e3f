//! Favorite breeds of the signed-in user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The set is session-scoped: loaded after sign-in, cleared on logout and
//! never persisted. Toggles flip membership before the backend answers and
//! flip it back if the request fails.
//!
//! TRADE-OFFS
//! ==========
//! Toggles of the same breed are serialized with a per-breed async lock held
//! from the membership read to the rollback decision. Without it a slow
//! failing add could roll back over a later successful remove.

#[cfg(test)]
#[path = "favorites_test.rs"]
mod favorites_test;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use super::store::Store;
use crate::net::api::ApiClient;

const FAVORITES_UNAVAILABLE: &str = "Unable to load favorites";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FavoritesState {
    pub favorite_ids: BTreeSet<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Why a toggle was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FavoriteError {
    /// The backend rejected the credential; the caller should prompt sign-in.
    #[error("sign in to manage favorites")]
    NoSession,
    #[error("favorite update failed: {0}")]
    RequestFailed(String),
}

type LockTable = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Holds one breed's toggle lock; drops the table entry when nobody waits.
struct BreedLock {
    table: LockTable,
    breed_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for BreedLock {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Table entry plus the guard we still hold.
        if table.get(&self.breed_id).is_some_and(|lock| Arc::strong_count(lock) <= 2) {
            table.remove(&self.breed_id);
        }
    }
}

#[derive(Clone)]
pub struct FavoritesStore {
    state: Store<FavoritesState>,
    api: ApiClient,
    locks: LockTable,
}

impl FavoritesStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { state: Store::default(), api, locks: LockTable::default() }
    }

    #[must_use]
    pub fn state(&self) -> &Store<FavoritesState> {
        &self.state
    }

    #[must_use]
    pub fn is_favorite(&self, breed_id: &str) -> bool {
        self.state.with(|s| s.favorite_ids.contains(breed_id))
    }

    /// Replace the set with the backend's list.
    ///
    /// A failure leaves the current set untouched and records
    /// "Unable to load favorites".
    pub async fn fetch_favorites(&self) {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match self.api.list_favorites().await {
            Ok(ids) => {
                tracing::debug!(count = ids.len(), "favorites loaded");
                self.state.update(|s| {
                    s.favorite_ids = ids.into_iter().collect();
                    s.is_loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "favorites fetch failed");
                self.state.update(|s| {
                    s.is_loading = false;
                    s.error = Some(FAVORITES_UNAVAILABLE.to_owned());
                });
            }
        }
    }

    /// Flip membership of `breed_id` and confirm with the backend.
    ///
    /// Returns the new membership on success.
    ///
    /// # Errors
    ///
    /// [`FavoriteError::NoSession`] on 401, [`FavoriteError::RequestFailed`]
    /// for anything else. Membership is flipped back in both cases.
    pub async fn toggle_favorite(&self, breed_id: &str) -> Result<bool, FavoriteError> {
        let _lock = self.lock_breed(breed_id).await;

        let was_favorite = self.is_favorite(breed_id);
        self.flip(breed_id);

        let result = if was_favorite {
            self.api.remove_favorite(breed_id).await
        } else {
            self.api.add_favorite(breed_id).await
        };

        match result {
            Ok(()) => Ok(!was_favorite),
            Err(e) => {
                tracing::warn!(breed_id, error = %e, "favorite toggle failed; rolling back");
                self.flip(breed_id);
                if e.is_unauthorized() {
                    Err(FavoriteError::NoSession)
                } else {
                    Err(FavoriteError::RequestFailed(e.to_string()))
                }
            }
        }
    }

    /// Forget everything; used on logout.
    pub fn reset(&self) {
        self.state.update(|s| *s = FavoritesState::default());
    }

    fn flip(&self, breed_id: &str) {
        self.state.update(|s| {
            if !s.favorite_ids.remove(breed_id) {
                s.favorite_ids.insert(breed_id.to_owned());
            }
        });
    }

    async fn lock_breed(&self, breed_id: &str) -> BreedLock {
        let lock = {
            let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(breed_id.to_owned()).or_default())
        };
        let guard = lock.lock_owned().await;
        BreedLock { table: Arc::clone(&self.locks), breed_id: breed_id.to_owned(), _guard: guard }
    }
}
