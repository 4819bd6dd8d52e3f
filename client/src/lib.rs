//! Client core for the Pawpedia dog-breed encyclopedia.
//!
//! SYSTEM CONTEXT
//! ==============
//! Front ends call store actions in `state`, stores call the typed
//! `net::api::ApiClient`, and the client talks to the REST backend through a
//! `net::transport::Transport`. Persisted session data lives behind
//! `storage::SessionStorage`.

pub mod config;
pub mod net;
pub mod state;
pub mod storage;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ClientConfig;
pub use net::api::ApiClient;
pub use net::error::ApiError;
pub use state::AppState;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
