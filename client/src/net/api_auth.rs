//! `/auth/*` endpoints.

use serde::Deserialize;

use super::ApiClient;
use crate::net::error::ApiError;
use crate::net::transport::ApiRequest;
use crate::net::types::{AuthPayload, Credentials, ProfileUpdate, RegisterRequest, User};

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

impl ApiClient {
    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError> {
        let body = serde_json::to_value(credentials).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send_for_data(ApiRequest::post("/auth/login").with_json(body))
            .await
    }

    /// `POST /auth/signup`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn signup(&self, request: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send_for_data(ApiRequest::post("/auth/signup").with_json(body))
            .await
    }

    /// `POST /auth/logout` with an explicit token, since the persisted copy is
    /// already gone by the time the call goes out.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::post("/auth/logout").with_bearer(token))
            .await
            .map(|_| ())
    }

    /// `GET /auth/profile` for the current credential.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token is rejected.
    pub async fn profile(&self) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self
            .send_for_data(ApiRequest::get("/auth/profile"))
            .await?;
        Ok(envelope.user)
    }

    /// `PUT /auth/profile`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let body = serde_json::to_value(update).map_err(|e| ApiError::Parse(e.to_string()))?;
        let envelope: UserEnvelope = self
            .send_for_data(ApiRequest::put("/auth/profile").with_json(body))
            .await?;
        Ok(envelope.user)
    }
}
