//! `/dogs/*` endpoints: breeds and favorites.

use serde_json::Value;

use super::ApiClient;
use crate::net::error::ApiError;
use crate::net::transport::{ApiRequest, path_segment};
use crate::net::types::{Breed, BreedInput, BreedPage, BreedQuery};

fn breed_path(id: &str) -> String {
    format!("/dogs/breeds/{}", path_segment(id))
}

fn favorite_path(breed_id: &str) -> String {
    format!("/dogs/favorites/{}", path_segment(breed_id))
}

impl ApiClient {
    /// `GET /dogs/breeds`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn list_breeds(&self, query: &BreedQuery) -> Result<BreedPage, ApiError> {
        self.send_for_data(ApiRequest::get("/dogs/breeds").with_query(query.to_pairs()))
            .await
    }

    /// `GET /dogs/breeds/:id`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn get_breed(&self, id: &str) -> Result<Breed, ApiError> {
        self.send_for(ApiRequest::get(breed_path(id)), "breed")
            .await
    }

    /// `POST /dogs/breeds` (admin).
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn create_breed(&self, input: &BreedInput) -> Result<(), ApiError> {
        let body = serde_json::to_value(input).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send(ApiRequest::post("/dogs/breeds").with_json(body))
            .await
            .map(|_| ())
    }

    /// `PUT /dogs/breeds/:id` (admin).
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn update_breed(&self, id: &str, input: &BreedInput) -> Result<(), ApiError> {
        let body = serde_json::to_value(input).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.send(ApiRequest::put(breed_path(id)).with_json(body))
            .await
            .map(|_| ())
    }

    /// `DELETE /dogs/breeds/:id` (admin).
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn delete_breed(&self, id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(breed_path(id)))
            .await
            .map(|_| ())
    }

    /// `GET /dogs/favorites`, reduced to breed identifiers.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn list_favorites(&self) -> Result<Vec<String>, ApiError> {
        let favorites: Vec<Value> = self
            .send_for(ApiRequest::get("/dogs/favorites"), "favorites")
            .await?;
        Ok(favorites.iter().filter_map(favorite_id).collect())
    }

    /// `POST /dogs/favorites/:id`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn add_favorite(&self, breed_id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::post(favorite_path(breed_id)))
            .await
            .map(|_| ())
    }

    /// `DELETE /dogs/favorites/:id`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] on failure.
    pub async fn remove_favorite(&self, breed_id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(favorite_path(breed_id)))
            .await
            .map(|_| ())
    }
}

/// Favorites arrive as populated breed documents or bare ids.
pub(crate) fn favorite_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Object(map) => map
            .get("_id")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}
