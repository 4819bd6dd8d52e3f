//! Community posts and their comments.
//!
//! Mutations never patch the cached list: after the backend accepts a
//! change the affected view is refetched, so counts, ordering and populated
//! authors always come from the server.

#[cfg(test)]
#[path = "posts_test.rs"]
mod posts_test;

use super::store::Store;
use super::{ActionError, ActionResult};
use crate::net::api::ApiClient;
use crate::net::types::{Post, PostQuery};
use crate::util::validation::{PostForm, validate_comment};

const POSTS_UNAVAILABLE: &str = "Unable to load posts";
const POST_NOT_FOUND: &str = "Post not found";
const POST_CREATE_FAILED: &str = "Unable to publish post";
const POST_UPDATE_FAILED: &str = "Unable to update post";
const POST_DELETE_FAILED: &str = "Unable to delete post";
const COMMENT_ADD_FAILED: &str = "Unable to add comment";
const COMMENT_DELETE_FAILED: &str = "Unable to delete comment";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostFilters {
    /// Case-insensitive substring of title or content.
    pub search: String,
    /// Case-insensitive exact tag.
    pub tag: Option<String>,
}

impl PostFilters {
    #[must_use]
    pub fn matches(&self, post: &Post) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty()
            && !post.title.to_lowercase().contains(&search)
            && !post.content.to_lowercase().contains(&search)
        {
            return false;
        }
        match self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => post.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
            None => true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostsState {
    pub posts: Vec<Post>,
    pub selected_post: Option<Post>,
    pub filters: PostFilters,
    pub last_query: PostQuery,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct PostsStore {
    state: Store<PostsState>,
    api: ApiClient,
}

impl PostsStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { state: Store::default(), api }
    }

    #[must_use]
    pub fn state(&self) -> &Store<PostsState> {
        &self.state
    }

    /// # Errors
    ///
    /// Returns the backend message or "Unable to load posts".
    pub async fn fetch_posts(&self, query: PostQuery) -> ActionResult {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
            s.last_query = query.clone();
        });
        match self.api.list_posts(&query).await {
            Ok(posts) => {
                tracing::debug!(count = posts.len(), "posts loaded");
                self.state.update(|s| {
                    s.posts = posts;
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => Err(self.fail(ActionError::from_api(&e, POSTS_UNAVAILABLE))),
        }
    }

    /// Load one post with its comments into `selected_post`.
    ///
    /// # Errors
    ///
    /// Returns the backend message or "Post not found".
    pub async fn fetch_post(&self, id: &str) -> ActionResult<Post> {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match self.api.get_post(id).await {
            Ok(post) => {
                self.state.update(|s| {
                    s.selected_post = Some(post.clone());
                    s.is_loading = false;
                });
                Ok(post)
            }
            Err(e) => Err(self.fail(ActionError::from_api(&e, POST_NOT_FOUND))),
        }
    }

    pub fn clear_selected_post(&self) {
        self.state.update(|s| s.selected_post = None);
    }

    /// Validate and publish a post, then refetch the list.
    ///
    /// # Errors
    ///
    /// [`ActionError::Invalid`] without any request when the form fails its
    /// checks, otherwise the backend message or "Unable to publish post".
    pub async fn create_post(&self, form: &PostForm) -> ActionResult {
        form.validate().into_result().map_err(ActionError::Invalid)?;
        if let Err(e) = self.api.create_post(&form.to_input()).await {
            return Err(self.fail(ActionError::from_api(&e, POST_CREATE_FAILED)));
        }
        tracing::info!(title = %form.title.trim(), "post published");
        self.refetch_posts().await;
        Ok(())
    }

    /// Validate and save an edited post, then refetch the list.
    ///
    /// # Errors
    ///
    /// [`ActionError::Invalid`] without any request when the form fails its
    /// checks, otherwise the backend message or "Unable to update post".
    pub async fn update_post(&self, id: &str, form: &PostForm) -> ActionResult {
        form.validate().into_result().map_err(ActionError::Invalid)?;
        if let Err(e) = self.api.update_post(id, &form.to_input()).await {
            return Err(self.fail(ActionError::from_api(&e, POST_UPDATE_FAILED)));
        }
        tracing::info!(post_id = id, "post updated");
        self.refetch_posts().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend message or "Unable to delete post".
    pub async fn delete_post(&self, id: &str) -> ActionResult {
        if let Err(e) = self.api.delete_post(id).await {
            return Err(self.fail(ActionError::from_api(&e, POST_DELETE_FAILED)));
        }
        tracing::info!(post_id = id, "post deleted");
        self.state.update(|s| {
            if s.selected_post.as_ref().is_some_and(|p| p.id == id) {
                s.selected_post = None;
            }
        });
        self.refetch_posts().await;
        Ok(())
    }

    /// Comment on a post, then reload that post.
    ///
    /// # Errors
    ///
    /// [`ActionError::Invalid`] for an empty or oversized comment, otherwise
    /// the backend message or "Unable to add comment".
    pub async fn add_comment(&self, post_id: &str, content: &str) -> ActionResult {
        validate_comment(content).into_result().map_err(ActionError::Invalid)?;
        if let Err(e) = self.api.add_comment(post_id, content.trim()).await {
            return Err(self.fail(ActionError::from_api(&e, COMMENT_ADD_FAILED)));
        }
        self.refetch_post(post_id).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend message or "Unable to delete comment".
    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> ActionResult {
        if let Err(e) = self.api.delete_comment(post_id, comment_id).await {
            return Err(self.fail(ActionError::from_api(&e, COMMENT_DELETE_FAILED)));
        }
        self.refetch_post(post_id).await;
        Ok(())
    }

    pub fn set_filters(&self, filters: PostFilters) {
        self.state.update(|s| s.filters = filters);
    }

    /// Cached posts narrowed by the current filters, in fetched order.
    #[must_use]
    pub fn filtered(&self) -> Vec<Post> {
        self.state.with(|s| {
            s.posts
                .iter()
                .filter(|post| s.filters.matches(post))
                .cloned()
                .collect()
        })
    }

    async fn refetch_posts(&self) {
        let query = self.state.with(|s| s.last_query.clone());
        if let Err(e) = self.fetch_posts(query).await {
            tracing::warn!(error = %e, "post refetch after mutation failed");
        }
    }

    async fn refetch_post(&self, post_id: &str) {
        if let Err(e) = self.fetch_post(post_id).await {
            tracing::warn!(post_id, error = %e, "post reload after comment change failed");
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
