//! Account administration: list users and assign roles.
//!
//! Every action takes the acting user and refuses locally unless it is an
//! administrator. The backend checks again; the local check keeps non-admin
//! front ends from issuing calls that can only fail.

#[cfg(test)]
#[path = "users_test.rs"]
mod users_test;

use super::store::Store;
use super::{ActionError, ActionResult};
use crate::net::api::ApiClient;
use crate::net::types::{Role, User};

const USERS_UNAVAILABLE: &str = "Unable to load users";
const ROLE_UPDATE_FAILED: &str = "Unable to change role";
const ADMIN_ONLY: &str = "Administrator access required";
const OWN_ROLE: &str = "You cannot change your own role";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsersState {
    pub users: Vec<User>,
    pub is_loading: bool,
    /// User whose role change is in flight.
    pub updating_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct UsersStore {
    state: Store<UsersState>,
    api: ApiClient,
}

fn require_admin(actor: &User) -> ActionResult {
    if actor.is_admin() { Ok(()) } else { Err(ActionError::Forbidden(ADMIN_ONLY.to_owned())) }
}

impl UsersStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { state: Store::default(), api }
    }

    #[must_use]
    pub fn state(&self) -> &Store<UsersState> {
        &self.state
    }

    /// # Errors
    ///
    /// [`ActionError::Forbidden`] for a non-admin actor, otherwise the backend
    /// message or "Unable to load users".
    pub async fn fetch_users(&self, actor: &User) -> ActionResult {
        require_admin(actor)?;
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match self.api.list_users().await {
            Ok(users) => {
                self.state.update(|s| {
                    s.users = users;
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                let error = ActionError::from_api(&e, USERS_UNAVAILABLE);
                self.state.update(|s| {
                    s.is_loading = false;
                    s.error = Some(error.message());
                });
                Err(error)
            }
        }
    }

    /// Assign `role` to `target_id` and swap the returned record into the list.
    ///
    /// # Errors
    ///
    /// [`ActionError::Forbidden`] for a non-admin actor or when the target is
    /// the actor, otherwise the backend message or "Unable to change role".
    pub async fn update_role(&self, actor: &User, target_id: &str, role: Role) -> ActionResult<User> {
        require_admin(actor)?;
        if target_id == actor.id {
            return Err(ActionError::Forbidden(OWN_ROLE.to_owned()));
        }

        self.state.update(|s| {
            s.updating_id = Some(target_id.to_owned());
            s.error = None;
        });
        let result = self.api.update_user_role(target_id, role).await;
        match result {
            Ok(updated) => {
                tracing::info!(target_id, role = %updated.role, "role changed");
                self.state.update(|s| {
                    if let Some(slot) = s.users.iter_mut().find(|u| u.id == target_id) {
                        *slot = updated.clone();
                    }
                    s.updating_id = None;
                });
                Ok(updated)
            }
            Err(e) => {
                let error = ActionError::from_api(&e, ROLE_UPDATE_FAILED);
                self.state.update(|s| {
                    s.updating_id = None;
                    s.error = Some(error.message());
                });
                Err(error)
            }
        }
    }

    /// Forget the loaded list; used on logout.
    pub fn reset(&self) {
        self.state.update(|s| *s = UsersState::default());
    }
}
