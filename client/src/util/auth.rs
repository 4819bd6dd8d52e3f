//! Shared route-guard decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view applies the same rule: wait while the session is
//! loading, send signed-out users to `/login`, refuse users whose role ranks
//! below the required one.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::Role;
use crate::state::session::SessionState;

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    /// Session still loading or being revalidated; show a placeholder.
    Pending,
    RedirectToLogin,
    /// Signed in with a role below the required one.
    Forbidden,
    Granted,
}

/// Decide what a protected view may render for `session`.
///
/// A restored but not yet revalidated session is still loading, so it never
/// yields [`RouteAccess::Granted`].
#[must_use]
pub fn route_access(session: &SessionState, required: Option<Role>) -> RouteAccess {
    if session.is_loading {
        return RouteAccess::Pending;
    }
    let Some(user) = session.user.as_ref().filter(|_| session.is_authenticated && session.token.is_some()) else {
        return RouteAccess::RedirectToLogin;
    };
    match required {
        Some(role) if !user.role.satisfies(role) => RouteAccess::Forbidden,
        _ => RouteAccess::Granted,
    }
}

/// Redirect to `/login` whenever the session has settled and nobody is signed in.
#[must_use]
pub fn should_redirect_unauth(session: &SessionState) -> bool {
    route_access(session, None) == RouteAccess::RedirectToLogin
}
