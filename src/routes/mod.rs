//! Route table and navigation.
//!
//! ARCHITECTURE
//! ============
//! `Route` maps paths to views. `Navigator` is the routing collaborator: it
//! tracks the current location plus its transient `NavState`, and runs the
//! guard in `guard` on every navigation to a protected route.

pub mod guard;

use crate::state::auth::AuthController;
use guard::{GuardDecision, NavState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    Features,
    SignIn,
    SignUp,
    ForgotPassword,
    Dashboard,
    Customers,
    Albums,
    Orders,
    Settings,
    NotFound,
}

impl Route {
    /// Resolve a path, ignoring query string, fragment and trailing slash.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/" => Self::Home,
            "/about" => Self::About,
            "/features" => Self::Features,
            "/signin" => Self::SignIn,
            "/signup" => Self::SignUp,
            "/forgot-password" => Self::ForgotPassword,
            "/dashboard" => Self::Dashboard,
            "/dashboard/customers" => Self::Customers,
            "/dashboard/albums" => Self::Albums,
            "/dashboard/orders" => Self::Orders,
            "/dashboard/settings" => Self::Settings,
            _ => Self::NotFound,
        }
    }

    /// Whether the route sits behind the auth guard.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard | Self::Customers | Self::Albums | Self::Orders | Self::Settings)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::About => "About",
            Self::Features => "Features",
            Self::SignIn => "Sign In",
            Self::SignUp => "Sign Up",
            Self::ForgotPassword => "Forgot Password",
            Self::Dashboard => "Dashboard",
            Self::Customers => "Customers",
            Self::Albums => "Albums",
            Self::Orders => "Orders",
            Self::Settings => "Settings",
            Self::NotFound => "404 - Page Not Found",
        }
    }
}

/// How a navigation resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Rendered,
    /// Guard is waiting on session validation.
    Loading,
    /// Sent to sign-in; `from` is the path originally requested.
    Redirected { from: String },
}

/// Result of one navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub location: String,
    pub route: Route,
    pub outcome: Outcome,
}

/// Current location plus the guard that protects it.
pub struct Navigator {
    auth: AuthController,
    location: String,
    state: NavState,
}

impl Navigator {
    #[must_use]
    pub fn new(auth: AuthController) -> Self {
        Self { auth, location: "/".to_owned(), state: NavState::default() }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// Navigate to `path`, replacing the current location.
    pub fn navigate(&mut self, path: &str) -> Navigation {
        self.navigate_with(path, NavState::default())
    }

    /// Navigate to `path` carrying `state` (e.g. a pending destination).
    pub fn navigate_with(&mut self, path: &str, state: NavState) -> Navigation {
        let route = Route::parse(path);
        if route.is_protected() {
            match guard::evaluate(self.auth.status(), path) {
                GuardDecision::Render => {}
                GuardDecision::Loading => {
                    self.location = path.to_owned();
                    self.state = state;
                    return Navigation { location: path.to_owned(), route, outcome: Outcome::Loading };
                }
                GuardDecision::Redirect { to, state } => {
                    tracing::debug!(from = %path, %to, "redirecting unauthenticated navigation");
                    self.location.clone_from(&to);
                    self.state = state;
                    return Navigation {
                        route: Route::parse(&to),
                        location: to,
                        outcome: Outcome::Redirected { from: path.to_owned() },
                    };
                }
            }
        }
        self.location = path.to_owned();
        self.state = state;
        Navigation { location: path.to_owned(), route, outcome: Outcome::Rendered }
    }

    /// Re-run the guard for the current location, e.g. once validation settles.
    pub fn refresh(&mut self) -> Navigation {
        let path = self.location.clone();
        let state = std::mem::take(&mut self.state);
        self.navigate_with(&path, state)
    }

    /// Leave the sign-in view after a successful sign-in, resuming the
    /// pending destination if one was attached.
    pub fn complete_sign_in(&mut self) -> Navigation {
        let target = guard::resume_target(&mut self.state);
        self.navigate(&target)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
