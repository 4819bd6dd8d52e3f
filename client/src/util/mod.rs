//! Utility helpers shared across front ends.
//!
//! SYSTEM CONTEXT
//! ==============
//! Form checks and route guards live here so every front end applies
//! identical rules without going through a store.

pub mod auth;
pub mod validation;
