//! Persisted client state behind a localStorage-shaped key/value seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store writes its persisted subset here and the API client
//! reads the bearer token from here at request time. Both go through the
//! helpers below so the envelope format lives in one place.
//!
//! TRADE-OFFS
//! ==========
//! A persisted token is an untrusted cache of server truth. Nothing in this
//! module decides whether a session is live; `state::session` revalidates.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::net::types::User;

/// Storage key holding the serialized session envelope.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";
const SESSION_STATE_VERSION: u32 = 0;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// String key/value storage that survives process restarts (or not, for
/// [`MemoryStorage`]).
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the value could not be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the key could not be removed.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// IMPLEMENTATIONS
// =============================================================================

/// In-process storage; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "refusing storage read");
                return None;
            }
        };
        match std::fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "storage read failed");
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// SESSION ENVELOPE
// =============================================================================

/// The subset of session state that survives restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

#[derive(Deserialize)]
struct TokenOnly {
    #[serde(default)]
    token: Option<String>,
}

/// Read the persisted session. Missing or corrupt data reads as `None`.
pub fn load_session(storage: &dyn SessionStorage) -> Option<PersistedSession> {
    let raw = storage.get_item(SESSION_STORAGE_KEY)?;
    match serde_json::from_str::<Envelope<PersistedSession>>(&raw) {
        Ok(envelope) => Some(envelope.state),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable persisted session");
            None
        }
    }
}

/// Write the persisted session envelope.
///
/// # Errors
///
/// Returns [`StorageError`] if encoding or the underlying write fails.
pub fn save_session(storage: &dyn SessionStorage, session: &PersistedSession) -> Result<(), StorageError> {
    let raw = serde_json::to_string(&Envelope { state: session, version: SESSION_STATE_VERSION })?;
    storage.set_item(SESSION_STORAGE_KEY, &raw)
}

/// Remove the persisted session entirely.
///
/// # Errors
///
/// Returns [`StorageError`] if the underlying removal fails.
pub fn clear_session(storage: &dyn SessionStorage) -> Result<(), StorageError> {
    storage.remove_item(SESSION_STORAGE_KEY)
}

/// The bearer token currently persisted, if any.
pub fn stored_token(storage: &dyn SessionStorage) -> Option<String> {
    let raw = storage.get_item(SESSION_STORAGE_KEY)?;
    match serde_json::from_str::<Envelope<TokenOnly>>(&raw) {
        Ok(envelope) => envelope.state.token.filter(|t| !t.is_empty()),
        Err(e) => {
            tracing::debug!(error = %e, "persisted session unreadable; sending unauthenticated");
            None
        }
    }
}
