//! Networking modules for the REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` performs the HTTP I/O, `api` adds the session rules and typed
//! endpoints, `types` defines the wire schema and `error` the failure
//! taxonomy shared by every store.

pub mod api;
pub mod error;
pub mod transport;
pub mod types;
