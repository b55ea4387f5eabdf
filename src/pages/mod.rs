//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns its form checks and submit orchestration; `render` picks
//! the page for a resolved navigation and produces its terminal text.

pub mod dashboard;
pub mod forgot_password;
pub mod signin;
pub mod signup;

use crate::routes::guard::NavState;
use crate::routes::{Navigation, Outcome, Route};
use crate::services::auth::DemoCredentials;
use crate::state::auth::AuthController;

pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// Text for the view a navigation resolved to.
#[must_use]
pub fn render(navigation: &Navigation, state: &NavState, auth: &AuthController, demo: &DemoCredentials) -> String {
    if navigation.outcome == Outcome::Loading {
        return LOADING_PLACEHOLDER.to_owned();
    }
    match navigation.route {
        Route::Home => "Launchpad\nSign in at /signin or create an account at /signup.".to_owned(),
        Route::About | Route::Features => navigation.route.title().to_owned(),
        Route::SignIn => signin::render(auth.last_error().as_ref(), state, demo),
        Route::SignUp => signup::render(auth.last_error().map(signup::SignUpError::from).as_ref()),
        Route::ForgotPassword => "Forgot Password\nEnter your email to reset your password.".to_owned(),
        Route::Dashboard => auth
            .current_user()
            .map_or_else(|| Route::Dashboard.title().to_owned(), |user| dashboard::render(&user)),
        route @ (Route::Customers | Route::Albums | Route::Orders | Route::Settings) => {
            dashboard::render_section(route)
        }
        Route::NotFound => {
            "404 - Page Not Found\nThe page you are looking for doesn't exist or has been moved.".to_owned()
        }
    }
}
