//! Sign-up view with caller-side form checks.
//!
//! The controller performs no validation of its own, so everything a user
//! can get wrong is caught here before `signup` is invoked.

use std::fmt::Write;

use crate::routes::guard::{DEFAULT_LANDING_PATH, SIGN_IN_PATH};
use crate::routes::{Navigation, Navigator};
use crate::services::auth::AuthError;
use crate::state::auth::AuthController;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignUpError {
    #[error("{0}")]
    Form(&'static str),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl SignUpForm {
    /// Check the form in the order the fields appear on screen.
    ///
    /// # Errors
    ///
    /// Returns the first problem found as a displayable message.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Enter your name.");
        }
        if self.email.trim().is_empty() {
            return Err("Enter your email address.");
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 8 characters long");
        }
        if !self.accept_terms {
            return Err("You must agree to the terms and conditions");
        }
        Ok(())
    }
}

/// Render the sign-up screen, with `error` shown above the submit control.
#[must_use]
pub fn render(error: Option<&SignUpError>) -> String {
    let mut out = String::from("Sign Up\nCreate your account to get started.\n");
    if let Some(err) = error {
        let _ = writeln!(out, "[error] {err}");
    }
    let _ = write!(
        out,
        "Password must be at least {MIN_PASSWORD_LEN} characters.\nAlready have an account? Sign in at {SIGN_IN_PATH}."
    );
    out
}

/// Validate, register, then land on the dashboard.
///
/// # Errors
///
/// Returns [`SignUpError::Form`] without touching the controller when the
/// form is invalid, or the controller's error otherwise.
pub async fn submit(auth: &AuthController, nav: &mut Navigator, form: &SignUpForm) -> Result<Navigation, SignUpError> {
    form.validate().map_err(SignUpError::Form)?;
    auth.signup(form.email.trim(), &form.password, form.name.trim()).await?;
    Ok(nav.navigate(DEFAULT_LANDING_PATH))
}

#[cfg(test)]
#[path = "signup_test.rs"]
mod tests;
