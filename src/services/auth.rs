//! Authentication backend seam and the demo implementation.
//!
//! ARCHITECTURE
//! ============
//! The controller talks to an `AuthBackend` and never to the network
//! directly. `DemoBackend` stands in for a real identity service: it checks
//! one fixed credential pair, synthesizes signup identities, and sleeps to
//! simulate round-trip latency.

use std::fmt::Write;
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use crate::net::types::{Role, Session, SessionToken, User};

const AVATAR_BASE_URL: &str = "https://ui-avatars.com/api/";

/// Closed set of failures an auth operation can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("stored session is unusable: {0}")]
    ValidationFailed(String),
    #[error("another sign-in or sign-up is already in progress")]
    OperationInProgress,
    #[error("already signed in; sign out first")]
    AlreadyAuthenticated,
    #[error("operation cancelled by sign-out")]
    Cancelled,
    #[error("network error: {0}")]
    Network(String),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("an unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Remote identity service as seen by the auth controller.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on mismatch, or a transport error kind.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Register a new account and open a session for it.
    ///
    /// # Errors
    ///
    /// Returns a transport error kind if the registration cannot complete.
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Session, AuthError>;

    /// Confirm a restored session is still honored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ValidationFailed`] if the session is rejected.
    async fn verify(&self, session: &Session) -> Result<(), AuthError>;
}

// =============================================================================
// TOKENS
// =============================================================================

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// ui-avatars URL rendering the initials of `name`.
#[must_use]
pub fn avatar_url(name: &str) -> Option<String> {
    reqwest::Url::parse_with_params(AVATAR_BASE_URL, &[("name", name), ("background", "0D8ABC"), ("color", "fff")])
        .ok()
        .map(String::from)
}

// =============================================================================
// DEMO BACKEND
// =============================================================================

/// The single credential pair the demo backend accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoCredentials {
    pub email: String,
    pub password: String,
}

impl Default for DemoCredentials {
    fn default() -> Self {
        Self { email: "demo@example.com".to_owned(), password: "password".to_owned() }
    }
}

/// Simulated latencies for each backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoLatency {
    pub request: Duration,
    pub validate: Duration,
}

impl DemoLatency {
    /// No simulated delay at all.
    pub const NONE: Self = Self { request: Duration::ZERO, validate: Duration::ZERO };
}

impl Default for DemoLatency {
    fn default() -> Self {
        Self { request: Duration::from_millis(1000), validate: Duration::from_millis(500) }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemoBackend {
    credentials: DemoCredentials,
    latency: DemoLatency,
}

impl DemoBackend {
    #[must_use]
    pub fn new(credentials: DemoCredentials, latency: DemoLatency) -> Self {
        Self { credentials, latency }
    }

    #[must_use]
    pub fn credentials(&self) -> &DemoCredentials {
        &self.credentials
    }

    fn demo_session(&self) -> Session {
        Session {
            user: User {
                id: "user-123".to_owned(),
                email: self.credentials.email.clone(),
                name: "Demo User".to_owned(),
                avatar_url: avatar_url("Demo User"),
                role: Role::Admin,
            },
            token: SessionToken::new("mock-jwt-token-123456789"),
        }
    }
}

async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait::async_trait]
impl AuthBackend for DemoBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        simulate_latency(self.latency.request).await;
        if email == self.credentials.email && password == self.credentials.password {
            Ok(self.demo_session())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn sign_up(&self, email: &str, _password: &str, name: &str) -> Result<Session, AuthError> {
        simulate_latency(self.latency.request).await;
        Ok(Session {
            user: User {
                id: format!("user-{}", Uuid::new_v4().simple()),
                email: email.to_owned(),
                name: name.to_owned(),
                avatar_url: avatar_url(name),
                role: Role::User,
            },
            token: SessionToken::new(format!("mock-jwt-token-{}", generate_token())),
        })
    }

    async fn verify(&self, session: &Session) -> Result<(), AuthError> {
        simulate_latency(self.latency.validate).await;
        if session.token.is_empty() {
            return Err(AuthError::ValidationFailed("empty session token".to_owned()));
        }
        if session.user.id.is_empty() {
            return Err(AuthError::ValidationFailed("user has no id".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
