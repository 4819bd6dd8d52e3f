//! `/posts/*` endpoints, comments included.

use super::ApiClient;
use crate::net::error::ApiError;
use crate::net::transport::{ApiRequest, path_segment};
use crate::net::types::{Post, PostInput, PostQuery};

fn post_path(id: &str) -> String {
    format!("/posts/{}", path_segment(id))
}

impl ApiClient {
    /// `GET /posts`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, ApiError> {
        self.send_for(ApiRequest::get("/posts").with_query(query.to_pairs()), "posts")
            .await
    }

    /// `GET /posts/:id`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn get_post(&self, id: &str) -> Result<Post, ApiError> {
        self.send_for(ApiRequest::get(post_path(id)), "post")
            .await
    }

    /// `POST /posts`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn create_post(&self, input: &PostInput) -> Result<(), ApiError> {
        let body = serde_json::to_value(input).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send(ApiRequest::post("/posts").with_json(body))
            .await
            .map(|_| ())
    }

    /// `PUT /posts/:id`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn update_post(&self, id: &str, input: &PostInput) -> Result<(), ApiError> {
        let body = serde_json::to_value(input).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send(ApiRequest::put(post_path(id)).with_json(body))
            .await
            .map(|_| ())
    }

    /// `DELETE /posts/:id`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn delete_post(&self, id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(post_path(id)))
            .await
            .map(|_| ())
    }

    /// `POST /posts/:id/comments`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn add_comment(&self, post_id: &str, content: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "content": content });
        let path = format!("/posts/{}/comments", path_segment(post_id));
        self.send(ApiRequest::post(path).with_json(body))
            .await
            .map(|_| ())
    }

    /// `DELETE /posts/:id/comments/:comment_id`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<(), ApiError> {
        let path = format!("/posts/{}/comments/{}", path_segment(post_id), path_segment(comment_id));
        self.send(ApiRequest::delete(path))
            .await
            .map(|_| ())
    }
}
