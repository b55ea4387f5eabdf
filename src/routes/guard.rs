//! Route guard for protected views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Evaluated on every navigation, not once per mount, so a session that
//! ends mid-use redirects on the very next guarded navigation.

use super::Route;
use crate::state::auth::AuthStatus;

/// Sign-in entry point unauthenticated navigations are sent to.
pub const SIGN_IN_PATH: &str = "/signin";
/// Where a successful sign-in lands when no destination was pending.
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";

/// Transient state attached to a navigation. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavState {
    /// Path the caller tried to reach before being redirected.
    pub from: Option<String>,
}

impl NavState {
    #[must_use]
    pub fn from_path(path: impl Into<String>) -> Self {
        Self { from: Some(path.into()) }
    }
}

/// Outcome of guarding one navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Validation still running; show a neutral placeholder, do not redirect.
    Loading,
    /// Send the caller to `to`, carrying the original destination in `state`.
    Redirect { to: String, state: NavState },
    /// Render the requested view unchanged.
    Render,
}

/// Decide what a navigation to protected `path` should do under `status`.
#[must_use]
pub fn evaluate(status: AuthStatus, path: &str) -> GuardDecision {
    match status {
        AuthStatus::Checking => GuardDecision::Loading,
        AuthStatus::Unauthenticated => GuardDecision::Redirect {
            to: SIGN_IN_PATH.to_owned(),
            state: NavState::from_path(path),
        },
        AuthStatus::Authenticated => GuardDecision::Render,
    }
}

/// Where to go after a successful sign-in. Consumes the pending destination.
pub fn resume_target(state: &mut NavState) -> String {
    state
        .from
        .take()
        .filter(|from| is_resumable(from))
        .unwrap_or_else(|| DEFAULT_LANDING_PATH.to_owned())
}

/// Only same-app absolute paths are valid resumption targets; looping back
/// to the sign-in page itself is pointless.
fn is_resumable(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && Route::parse(path) != Route::SignIn
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
