//! `/admin/*` endpoints.

use super::ApiClient;
use crate::net::error::ApiError;
use crate::net::transport::{ApiRequest, path_segment};
use crate::net::types::{Role, User};

impl ApiClient {
    /// `GET /admin/users`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.send_for(ApiRequest::get("/admin/users"), "users")
            .await
    }

    /// `PATCH /admin/users/:id/role`, returning the updated user.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn update_user_role(&self, user_id: &str, role: Role) -> Result<User, ApiError> {
        let body = serde_json::json!({ "role": role });
        let path = format!("/admin/users/{}/role", path_segment(user_id));
        self.send_for(ApiRequest::patch(path).with_json(body), "user")
            .await
    }
}
