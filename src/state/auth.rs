//! Auth-session state for the current installation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware views to coordinate sign-in
//! redirects and identity-dependent rendering. The controller is built once
//! at startup and handed to every consumer; clones share one state.
//!
//! DESIGN
//! ======
//! Six phases, three derived statuses:
//!
//! ```text
//!   Idle / Unauthenticated --login--> SigningIn  --ok--> Authenticated
//!   Idle / Unauthenticated --signup-> SigningUp  --ok--> Authenticated
//!   (startup, stored session) Validating --ok--> Authenticated
//!                                       --err-> Unauthenticated
//!   Authenticated --logout--> Unauthenticated
//! ```
//!
//! Only one mutating operation may be in flight. A `logout` bumps the
//! generation so late completions from before it are dropped instead of
//! resurrecting the session.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::net::types::{Session, SessionToken, User};
use crate::services::auth::{AuthBackend, AuthError};
use crate::store::session::{self, SessionStore, StoredSession};

/// Lifecycle phase of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    /// No session and no durable storage to hold one.
    Idle,
    /// A restored session is being confirmed.
    Validating,
    Authenticated,
    SigningIn,
    SigningUp,
    Unauthenticated,
}

/// What consumers see. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Checking,
    Authenticated,
    Unauthenticated,
}

impl AuthPhase {
    #[must_use]
    pub fn status(self) -> AuthStatus {
        match self {
            Self::Validating => AuthStatus::Checking,
            Self::Authenticated => AuthStatus::Authenticated,
            Self::Idle | Self::SigningIn | Self::SigningUp | Self::Unauthenticated => AuthStatus::Unauthenticated,
        }
    }

    /// Whether a suspended operation currently owns the controller.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Validating | Self::SigningIn | Self::SigningUp)
    }
}

struct AuthInner {
    phase: AuthPhase,
    session: Option<Session>,
    /// Raw store contents awaiting startup validation.
    restored: Option<(String, String)>,
    last_error: Option<AuthError>,
    generation: u64,
}

/// Ticket handed out when a mutating operation starts.
struct Attempt {
    generation: u64,
    prior: AuthPhase,
}

/// Single authority for the authentication lifecycle.
#[derive(Clone)]
pub struct AuthController {
    inner: Arc<Mutex<AuthInner>>,
    phase_tx: Arc<watch::Sender<AuthPhase>>,
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
}

impl AuthController {
    /// Build the controller from whatever the store holds.
    ///
    /// Starts in `Validating` when both session keys are present (call
    /// [`validate`](Self::validate) to settle it), in `Idle` when storage is
    /// unavailable, and in `Unauthenticated` otherwise.
    pub fn new(store: Arc<dyn SessionStore>, backend: Arc<dyn AuthBackend>) -> Self {
        let (phase, restored) = if !store.is_available() {
            (AuthPhase::Idle, None)
        } else {
            match session::read_session(store.as_ref()) {
                StoredSession::Present { user, token } => (AuthPhase::Validating, Some((user, token))),
                StoredSession::Absent => (AuthPhase::Unauthenticated, None),
            }
        };
        tracing::debug!(?phase, "auth controller initialized");
        let (phase_tx, _) = watch::channel(phase);
        Self {
            inner: Arc::new(Mutex::new(AuthInner { phase, session: None, restored, last_error: None, generation: 0 })),
            phase_tx: Arc::new(phase_tx),
            store,
            backend,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_phase(&self, inner: &mut AuthInner, phase: AuthPhase) {
        inner.phase = phase;
        self.phase_tx.send_replace(phase);
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.phase().status()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.lock().session.as_ref().map(|s| s.user.clone())
    }

    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.lock().session.as_ref().map(|s| s.token.clone())
    }

    /// Error from the most recent failed sign-in or sign-up, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<AuthError> {
        self.lock().last_error.clone()
    }

    /// Watch phase changes. The receiver starts at the current phase.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.phase_tx.subscribe()
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Confirm the restored (or current) session with the backend.
    ///
    /// From `Validating` this settles startup; from `Authenticated` it
    /// re-checks the live session. Any other phase is left untouched.
    /// Failures are handled here: the store is cleared and the controller
    /// falls back to `Unauthenticated`.
    pub async fn validate(&self) -> AuthStatus {
        let (generation, candidate) = {
            let mut inner = self.lock();
            let phase = inner.phase;
            let candidate = match phase {
                AuthPhase::Validating => match inner.restored.take() {
                    Some((user, token)) => decode_restored(&user, &token),
                    // Another validate() already owns this check.
                    None => return AuthStatus::Checking,
                },
                AuthPhase::Authenticated => match inner.session.clone() {
                    Some(session) => {
                        self.set_phase(&mut inner, AuthPhase::Validating);
                        Ok(session)
                    }
                    None => Err(AuthError::ValidationFailed("no session in memory".to_owned())),
                },
                phase => return phase.status(),
            };
            (inner.generation, candidate)
        };

        let verdict = match candidate {
            Ok(session) => self.backend.verify(&session).await.map(|()| session),
            Err(e) => Err(e),
        };

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!("validation result discarded after sign-out");
            return inner.phase.status();
        }
        inner.last_error = None;
        match verdict {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "session confirmed");
                inner.session = Some(session);
                self.set_phase(&mut inner, AuthPhase::Authenticated);
            }
            Err(e) => {
                tracing::warn!(error = %e, "session validation failed; clearing stored session");
                session::clear_session(self.store.as_ref());
                inner.session = None;
                self.set_phase(&mut inner, AuthPhase::Unauthenticated);
            }
        }
        inner.phase.status()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    fn begin(&self, target: AuthPhase) -> Result<Attempt, AuthError> {
        let mut inner = self.lock();
        let phase = inner.phase;
        let rejected = match phase {
            AuthPhase::Validating | AuthPhase::SigningIn | AuthPhase::SigningUp => AuthError::OperationInProgress,
            AuthPhase::Authenticated => AuthError::AlreadyAuthenticated,
            prior @ (AuthPhase::Idle | AuthPhase::Unauthenticated) => {
                inner.last_error = None;
                inner.generation += 1;
                self.set_phase(&mut inner, target);
                return Ok(Attempt { generation: inner.generation, prior });
            }
        };
        tracing::debug!(?phase, error = %rejected, "auth attempt rejected");
        inner.last_error = Some(rejected.clone());
        Err(rejected)
    }

    fn finish(&self, attempt: Attempt, result: Result<Session, AuthError>) -> Result<Session, AuthError> {
        let mut inner = self.lock();
        if inner.generation != attempt.generation {
            tracing::debug!("auth attempt superseded by sign-out");
            return Err(AuthError::Cancelled);
        }
        let result = result.and_then(|session| {
            session::write_session(self.store.as_ref(), &session)
                .map_err(|e| AuthError::Unexpected(e.to_string()))?;
            Ok(session)
        });
        match result {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, role = %session.user.role, "signed in");
                inner.session = Some(session.clone());
                inner.last_error = None;
                self.set_phase(&mut inner, AuthPhase::Authenticated);
                Ok(session)
            }
            Err(e) => {
                tracing::info!(error = %e, "authentication attempt failed");
                inner.last_error = Some(e.clone());
                self.set_phase(&mut inner, attempt.prior);
                Err(e)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on mismatch (store untouched),
    /// [`AuthError::OperationInProgress`] if another operation is suspended,
    /// [`AuthError::AlreadyAuthenticated`] if a session is live, and
    /// [`AuthError::Cancelled`] if a sign-out landed while waiting.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let attempt = self.begin(AuthPhase::SigningIn)?;
        tracing::debug!(%email, "sign-in started");
        let result = self.backend.sign_in(email, password).await;
        self.finish(attempt, result)
    }

    /// Register a new account and sign it in.
    ///
    /// No uniqueness check: the same email may sign up any number of times.
    ///
    /// # Errors
    ///
    /// Same in-flight and cancellation errors as [`login`](Self::login), plus
    /// whatever the backend reports.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<Session, AuthError> {
        let attempt = self.begin(AuthPhase::SigningUp)?;
        tracing::debug!(%email, "sign-up started");
        let result = self.backend.sign_up(email, password, name).await;
        self.finish(attempt, result)
    }

    /// Drop the session everywhere. Idempotent.
    pub fn logout(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.session = None;
        inner.restored = None;
        inner.last_error = None;
        session::clear_session(self.store.as_ref());
        self.set_phase(&mut inner, AuthPhase::Unauthenticated);
        tracing::info!("signed out");
    }
}

fn decode_restored(user: &str, token: &str) -> Result<Session, AuthError> {
    let user = session::decode_user(user).map_err(|e| AuthError::ValidationFailed(e.to_string()))?;
    let token = SessionToken::new(token);
    if token.is_empty() {
        return Err(AuthError::ValidationFailed("empty session token".to_owned()));
    }
    Ok(Session { user, token })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
