//! Observable state cell shared between a store and its views.
//!
//! DESIGN
//! ======
//! Mirrors the signal API the views expect (`get`/`with`/`update`) on top of
//! a `tokio::sync::watch` channel so front ends can also await changes.
//! Closures run under the channel lock: never call back into the same store
//! from inside `update` or `with`.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use tokio::sync::watch;

/// Cloning yields another handle to the same cell.
#[derive(Debug)]
pub struct Store<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self { tx: Arc::clone(&self.tx) }
    }
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Store<S> {
    #[must_use]
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.tx.borrow().clone()
    }

    /// Read through a borrow without cloning the whole state.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Mutate in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    /// Receiver that wakes on every `update`.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}
