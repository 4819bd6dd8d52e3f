//! Breed catalog: server-side listing, detail selection and local filters.
//!
//! `filters` narrow the already-fetched page in memory. Server-side
//! narrowing goes through [`BreedQuery`] on [`BreedsStore::fetch_breeds`];
//! the last query is kept so admin mutations can refetch the same view.

#[cfg(test)]
#[path = "breeds_test.rs"]
mod breeds_test;

use super::store::Store;
use super::{ActionError, ActionResult};
use crate::net::api::ApiClient;
use crate::net::types::{ActivityLevel, Breed, BreedInput, BreedQuery, BreedSize, Pagination};
use crate::util::validation;

const BREEDS_UNAVAILABLE: &str = "Unable to load breeds";
const BREED_NOT_FOUND: &str = "Breed not found";
const BREED_SAVE_FAILED: &str = "Unable to save breed";
const BREED_DELETE_FAILED: &str = "Unable to delete breed";

/// In-memory narrowing of the fetched list. Empty means "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BreedFilters {
    pub size: Option<BreedSize>,
    pub activity_level: Option<ActivityLevel>,
    pub search: String,
}

impl BreedFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.activity_level.is_none() && self.search.trim().is_empty()
    }

    /// Whether `breed` passes every active constraint.
    #[must_use]
    pub fn matches(&self, breed: &Breed) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() && !breed.name.to_lowercase().contains(&search) {
            return false;
        }
        if self.size.is_some() && breed.characteristics.size != self.size {
            return false;
        }
        if self.activity_level.is_some() && breed.characteristics.activity_level != self.activity_level {
            return false;
        }
        true
    }
}

/// Partial filter update; `None` leaves a field as is, `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct BreedFiltersPatch {
    pub size: Option<Option<BreedSize>>,
    pub activity_level: Option<Option<ActivityLevel>>,
    pub search: Option<String>,
}

/// Breeds in `breeds` passing `filters`, in their original order.
#[must_use]
pub fn filter_breeds<'a>(breeds: &'a [Breed], filters: &BreedFilters) -> Vec<&'a Breed> {
    breeds.iter().filter(|breed| filters.matches(breed)).collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BreedsState {
    pub breeds: Vec<Breed>,
    pub selected_breed: Option<Breed>,
    pub pagination: Option<Pagination>,
    pub filters: BreedFilters,
    pub last_query: BreedQuery,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct BreedsStore {
    state: Store<BreedsState>,
    api: ApiClient,
}

impl BreedsStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { state: Store::default(), api }
    }

    #[must_use]
    pub fn state(&self) -> &Store<BreedsState> {
        &self.state
    }

    /// Fetch one page of breeds and remember `query` for later refetches.
    ///
    /// # Errors
    ///
    /// Returns the backend message or "Unable to load breeds"; the current
    /// list is kept.
    pub async fn fetch_breeds(&self, query: BreedQuery) -> ActionResult {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
            s.last_query = query.clone();
        });
        match self.api.list_breeds(&query).await {
            Ok(page) => {
                tracing::debug!(count = page.breeds.len(), "breeds loaded");
                self.state.update(|s| {
                    s.breeds = page.breeds;
                    s.pagination = page.pagination;
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => Err(self.fail(ActionError::from_api(&e, BREEDS_UNAVAILABLE))),
        }
    }

    /// Load one breed into `selected_breed`.
    ///
    /// # Errors
    ///
    /// Returns the backend message or "Breed not found".
    pub async fn fetch_breed_by_id(&self, id: &str) -> ActionResult<Breed> {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match self.api.get_breed(id).await {
            Ok(breed) => {
                self.state.update(|s| {
                    s.selected_breed = Some(breed.clone());
                    s.is_loading = false;
                });
                Ok(breed)
            }
            Err(e) => Err(self.fail(ActionError::from_api(&e, BREED_NOT_FOUND))),
        }
    }

    pub fn clear_selected_breed(&self) {
        self.state.update(|s| s.selected_breed = None);
    }

    pub fn set_filters(&self, patch: BreedFiltersPatch) {
        self.state.update(|s| {
            if let Some(size) = patch.size {
                s.filters.size = size;
            }
            if let Some(level) = patch.activity_level {
                s.filters.activity_level = level;
            }
            if let Some(search) = patch.search {
                s.filters.search = search;
            }
        });
    }

    pub fn reset_filters(&self) {
        self.state.update(|s| s.filters = BreedFilters::default());
    }

    /// The fetched list narrowed by the current filters.
    #[must_use]
    pub fn filtered(&self) -> Vec<Breed> {
        self.state
            .with(|s| filter_breeds(&s.breeds, &s.filters).into_iter().cloned().collect())
    }

    /// Create a breed (admin) and refetch the current view.
    ///
    /// # Errors
    ///
    /// [`ActionError::Invalid`] when the record fails local checks (nothing
    /// is sent), otherwise the backend message or "Unable to save breed".
    pub async fn create_breed(&self, input: &BreedInput) -> ActionResult {
        validation::validate_breed_input(input).into_result().map_err(ActionError::Invalid)?;
        if let Err(e) = self.api.create_breed(input).await {
            return Err(self.fail(ActionError::from_api(&e, BREED_SAVE_FAILED)));
        }
        tracing::info!(name = %input.name, "breed created");
        self.refetch().await;
        Ok(())
    }

    /// Update a breed (admin) and refetch the current view.
    ///
    /// # Errors
    ///
    /// [`ActionError::Invalid`] when the record fails local checks (nothing
    /// is sent), otherwise the backend message or "Unable to save breed".
    pub async fn update_breed(&self, id: &str, input: &BreedInput) -> ActionResult {
        validation::validate_breed_input(input).into_result().map_err(ActionError::Invalid)?;
        if let Err(e) = self.api.update_breed(id, input).await {
            return Err(self.fail(ActionError::from_api(&e, BREED_SAVE_FAILED)));
        }
        tracing::info!(breed_id = id, "breed updated");
        self.refetch().await;
        Ok(())
    }

    /// Delete a breed (admin) and refetch the current view.
    ///
    /// # Errors
    ///
    /// Returns the backend message or "Unable to delete breed".
    pub async fn delete_breed(&self, id: &str) -> ActionResult {
        if let Err(e) = self.api.delete_breed(id).await {
            return Err(self.fail(ActionError::from_api(&e, BREED_DELETE_FAILED)));
        }
        tracing::info!(breed_id = id, "breed deleted");
        self.state.update(|s| {
            if s.selected_breed.as_ref().is_some_and(|b| b.id == id) {
                s.selected_breed = None;
            }
        });
        self.refetch().await;
        Ok(())
    }

    /// A failed refetch is recorded in `error` but does not fail the
    /// mutation that already succeeded.
    async fn refetch(&self) {
        let query = self.state.with(|s| s.last_query.clone());
        if let Err(e) = self.fetch_breeds(query).await {
            tracing::warn!(error = %e, "breed refetch after mutation failed");
        }
    }

    fn fail(&self, error: ActionError) -> ActionError {
        self.state.update(|s| {
            s.is_loading = false;
            s.error = Some(error.message());
        });
        error
    }
}
