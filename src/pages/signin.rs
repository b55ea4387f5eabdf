//! Sign-in view: credential form, inline error, post-login resumption.

use std::fmt::Write;

use crate::routes::guard::NavState;
use crate::routes::{Navigation, Navigator};
use crate::services::auth::{AuthError, DemoCredentials};
use crate::state::auth::AuthController;

/// Trim the email and require both fields before calling the controller.
pub fn validate_sign_in_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err("Enter both email and password.");
    }
    Ok((email.to_owned(), password.to_owned()))
}

/// Displayable text for an auth error shown next to the submit control.
#[must_use]
pub fn error_message(err: &AuthError, demo: &DemoCredentials) -> String {
    match err {
        AuthError::InvalidCredentials => format!(
            "Invalid email or password. Try using {} and {}.",
            demo.email, demo.password
        ),
        AuthError::OperationInProgress => "Already signing in, please wait.".to_owned(),
        other => other.to_string(),
    }
}

/// Render the sign-in screen.
#[must_use]
pub fn render(error: Option<&AuthError>, pending: &NavState, demo: &DemoCredentials) -> String {
    let mut out = String::from("Sign In\nWelcome back! Please sign in to your account.\n");
    if let Some(from) = &pending.from {
        let _ = writeln!(out, "You need to sign in to view {from}.");
    }
    if let Some(err) = error {
        let _ = writeln!(out, "[error] {}", error_message(err, demo));
    }
    let _ = write!(out, "Demo account: {} / {}", demo.email, demo.password);
    out
}

/// Submit the form: sign in, then leave for the pending destination.
///
/// # Errors
///
/// Returns the controller's error unchanged; the navigator stays on the
/// sign-in view with its pending destination intact.
pub async fn submit(
    auth: &AuthController,
    nav: &mut Navigator,
    email: &str,
    password: &str,
) -> Result<Navigation, AuthError> {
    auth.login(email, password).await?;
    Ok(nav.complete_sign_in())
}

#[cfg(test)]
#[path = "signin_test.rs"]
mod tests;
