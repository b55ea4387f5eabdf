use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::*;
use crate::net::types::Role;
use crate::services::auth::{DemoBackend, DemoCredentials, DemoLatency};
use crate::store::session::{MemoryStore, TOKEN_KEY, USER_KEY};

// =========================================================================
// Helpers
// =========================================================================

fn instant_backend() -> Arc<DemoBackend> {
    Arc::new(DemoBackend::new(DemoCredentials::default(), DemoLatency::NONE))
}

fn controller(store: &Arc<MemoryStore>) -> AuthController {
    AuthController::new(store.clone(), instant_backend())
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.write(
        USER_KEY,
        r#"{"id":"user-123","email":"demo@example.com","name":"Demo User","role":"admin"}"#,
    );
    store.write(TOKEN_KEY, "mock-jwt-token-123456789");
    store
}

/// Backend whose failures are scripted per test.
struct ScriptedBackend {
    inner: DemoBackend,
    sign_in_failure: Option<AuthError>,
    reject_verify: AtomicBool,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            inner: DemoBackend::new(DemoCredentials::default(), DemoLatency::NONE),
            sign_in_failure: None,
            reject_verify: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl AuthBackend for ScriptedBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if let Some(err) = &self.sign_in_failure {
            return Err(err.clone());
        }
        self.inner.sign_in(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Session, AuthError> {
        self.inner.sign_up(email, password, name).await
    }

    async fn verify(&self, session: &Session) -> Result<(), AuthError> {
        if self.reject_verify.load(Ordering::SeqCst) {
            return Err(AuthError::ValidationFailed("revoked".into()));
        }
        self.inner.verify(session).await
    }
}

// =========================================================================
// Startup
// =========================================================================

#[test]
fn empty_store_starts_unauthenticated_without_checking() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
    assert!(auth.current_user().is_none());
}

#[test]
fn partial_store_starts_unauthenticated() {
    let store = Arc::new(MemoryStore::new());
    store.write(TOKEN_KEY, "orphan-token");
    let auth = controller(&store);
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
}

#[test]
fn stored_session_starts_checking() {
    let auth = controller(&seeded_store());
    assert_eq!(auth.phase(), AuthPhase::Validating);
    assert_eq!(auth.status(), AuthStatus::Checking);
}

#[test]
fn unavailable_store_starts_idle() {
    let auth = AuthController::new(Arc::new(MemoryStore::disabled()), instant_backend());
    assert_eq!(auth.phase(), AuthPhase::Idle);
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn validate_confirms_stored_session() {
    let auth = controller(&seeded_store());
    assert_eq!(auth.validate().await, AuthStatus::Authenticated);
    let user = auth.current_user().unwrap();
    assert_eq!(user.email, "demo@example.com");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(auth.token().unwrap().expose(), "mock-jwt-token-123456789");
}

#[tokio::test]
async fn validate_corrupt_user_clears_store() {
    let store = Arc::new(MemoryStore::new());
    store.write(USER_KEY, "{garbage");
    store.write(TOKEN_KEY, "t");
    let auth = controller(&store);
    assert_eq!(auth.status(), AuthStatus::Checking);

    assert_eq!(auth.validate().await, AuthStatus::Unauthenticated);
    assert_eq!(store.read(USER_KEY), None);
    assert_eq!(store.read(TOKEN_KEY), None);
    assert!(auth.last_error().is_none(), "validation failures are never surfaced");
}

#[tokio::test]
async fn validate_blank_token_clears_store() {
    let store = seeded_store();
    store.write(TOKEN_KEY, "  ");
    let auth = controller(&store);
    assert_eq!(auth.validate().await, AuthStatus::Unauthenticated);
    assert_eq!(store.read(USER_KEY), None);
}

#[tokio::test]
async fn validate_is_noop_when_unauthenticated() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    assert_eq!(auth.validate().await, AuthStatus::Unauthenticated);
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
}

#[tokio::test(start_paused = true)]
async fn restart_with_session_never_flashes_unauthenticated() {
    let auth = AuthController::new(seeded_store(), Arc::new(DemoBackend::default()));
    let mut phases = auth.subscribe();
    let observer = tokio::spawn(async move {
        let mut seen = vec![*phases.borrow_and_update()];
        while phases.changed().await.is_ok() {
            let phase = *phases.borrow_and_update();
            seen.push(phase);
            if phase == AuthPhase::Authenticated {
                break;
            }
        }
        seen
    });

    let task = tokio::spawn({
        let auth = auth.clone();
        async move { auth.validate().await }
    });
    tokio::task::yield_now().await;
    assert_eq!(auth.status(), AuthStatus::Checking);

    assert_eq!(task.await.unwrap(), AuthStatus::Authenticated);
    let seen = observer.await.unwrap();
    assert_eq!(seen.first(), Some(&AuthPhase::Validating));
    assert_eq!(seen.last(), Some(&AuthPhase::Authenticated));
    assert!(!seen.contains(&AuthPhase::Unauthenticated));
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn login_demo_pair_authenticates_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    let session = auth.login("demo@example.com", "password").await.unwrap();

    assert_eq!(auth.status(), AuthStatus::Authenticated);
    assert_eq!(auth.current_user(), Some(session.user));
    assert!(store.read(USER_KEY).is_some());
    assert_eq!(store.read(TOKEN_KEY).as_deref(), Some("mock-jwt-token-123456789"));
}

#[tokio::test]
async fn login_mismatch_fails_and_leaves_store_untouched() {
    let store = Arc::new(MemoryStore::new());
    store.write("theme", "dark");
    let auth = controller(&store);

    for (email, password) in [("demo@example.com", "wrong"), ("x@y.z", "password"), ("", "")] {
        let err = auth.login(email, password).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(auth.status(), AuthStatus::Unauthenticated);
        assert_eq!(store.read(USER_KEY), None);
        assert_eq!(store.read(TOKEN_KEY), None);
        assert_eq!(store.read("theme").as_deref(), Some("dark"));
    }
    assert_eq!(auth.last_error(), Some(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn new_attempt_clears_previous_error() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    let _ = auth.login("demo@example.com", "nope").await;
    assert!(auth.last_error().is_some());

    auth.login("demo@example.com", "password").await.unwrap();
    assert!(auth.last_error().is_none());
}

#[tokio::test]
async fn login_while_authenticated_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    auth.login("demo@example.com", "password").await.unwrap();

    let err = auth.login("demo@example.com", "password").await.unwrap_err();
    assert_eq!(err, AuthError::AlreadyAuthenticated);
    assert_eq!(auth.status(), AuthStatus::Authenticated);
    assert_eq!(auth.last_error(), Some(AuthError::AlreadyAuthenticated));
}

#[tokio::test(start_paused = true)]
async fn rejected_attempt_replaces_stale_error_until_settled() {
    let auth = AuthController::new(Arc::new(MemoryStore::new()), Arc::new(DemoBackend::default()));
    let _ = auth.login("demo@example.com", "bad").await;
    assert_eq!(auth.last_error(), Some(AuthError::InvalidCredentials));

    let first = tokio::spawn({
        let auth = auth.clone();
        async move { auth.login("demo@example.com", "password").await }
    });
    tokio::task::yield_now().await;
    assert!(auth.last_error().is_none());

    let _ = auth.login("demo@example.com", "password").await;
    assert_eq!(auth.last_error(), Some(AuthError::OperationInProgress));

    assert!(first.await.unwrap().is_ok());
    assert!(auth.last_error().is_none());
}

#[tokio::test]
async fn backend_failure_reverts_to_prior_phase() {
    let backend = ScriptedBackend {
        sign_in_failure: Some(AuthError::Network("connection reset".into())),
        ..ScriptedBackend::new()
    };
    let store = Arc::new(MemoryStore::new());
    let auth = AuthController::new(store.clone(), Arc::new(backend));

    let err = auth.login("demo@example.com", "password").await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(auth.phase(), AuthPhase::Unauthenticated);
    assert_eq!(auth.last_error(), Some(err));
    assert_eq!(store.read(TOKEN_KEY), None);
}

#[tokio::test]
async fn failed_login_from_idle_returns_to_idle() {
    let auth = AuthController::new(Arc::new(MemoryStore::disabled()), instant_backend());
    let _ = auth.login("demo@example.com", "bad").await;
    assert_eq!(auth.phase(), AuthPhase::Idle);
}

#[tokio::test]
async fn login_without_storage_still_authenticates_in_memory() {
    let store = Arc::new(MemoryStore::disabled());
    let auth = AuthController::new(store.clone(), instant_backend());
    auth.login("demo@example.com", "password").await.unwrap();
    assert_eq!(auth.status(), AuthStatus::Authenticated);
    assert_eq!(store.read(TOKEN_KEY), None);
}

// =========================================================================
// In-flight guard
// =========================================================================

#[tokio::test(start_paused = true)]
async fn overlapping_attempts_are_rejected() {
    let auth = AuthController::new(Arc::new(MemoryStore::new()), Arc::new(DemoBackend::default()));
    let first = tokio::spawn({
        let auth = auth.clone();
        async move { auth.login("demo@example.com", "password").await }
    });
    tokio::task::yield_now().await;

    assert_eq!(auth.phase(), AuthPhase::SigningIn);
    assert!(auth.phase().is_busy());
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
    assert_eq!(auth.login("demo@example.com", "password").await.unwrap_err(), AuthError::OperationInProgress);
    assert_eq!(auth.signup("a@b.c", "longenough", "A").await.unwrap_err(), AuthError::OperationInProgress);

    assert!(first.await.unwrap().is_ok());
    assert_eq!(auth.status(), AuthStatus::Authenticated);
    assert_eq!(auth.current_user().unwrap().id, "user-123");
}

#[tokio::test(start_paused = true)]
async fn signup_in_flight_reports_signing_up() {
    let auth = AuthController::new(Arc::new(MemoryStore::new()), Arc::new(DemoBackend::default()));
    let pending = tokio::spawn({
        let auth = auth.clone();
        async move { auth.signup("new@example.com", "longenough", "New").await }
    });
    tokio::task::yield_now().await;
    assert_eq!(auth.phase(), AuthPhase::SigningUp);
    assert!(pending.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn logout_during_login_cancels_it() {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthController::new(store.clone(), Arc::new(DemoBackend::default()));
    let pending = tokio::spawn({
        let auth = auth.clone();
        async move { auth.login("demo@example.com", "password").await }
    });
    tokio::task::yield_now().await;

    auth.logout();
    assert_eq!(pending.await.unwrap().unwrap_err(), AuthError::Cancelled);
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
    assert_eq!(store.read(TOKEN_KEY), None);
}

#[tokio::test(start_paused = true)]
async fn logout_during_startup_validation_wins() {
    let store = seeded_store();
    let auth = AuthController::new(store.clone(), Arc::new(DemoBackend::default()));
    let pending = tokio::spawn({
        let auth = auth.clone();
        async move { auth.validate().await }
    });
    tokio::task::yield_now().await;

    auth.logout();
    assert_eq!(pending.await.unwrap(), AuthStatus::Unauthenticated);
    assert!(auth.current_user().is_none());
    assert_eq!(store.read(USER_KEY), None);
}

#[tokio::test(start_paused = true)]
async fn login_is_rejected_while_validating() {
    let auth = AuthController::new(seeded_store(), Arc::new(DemoBackend::default()));
    assert_eq!(auth.login("demo@example.com", "password").await.unwrap_err(), AuthError::OperationInProgress);
    assert_eq!(auth.phase(), AuthPhase::Validating);
    assert_eq!(auth.last_error(), Some(AuthError::OperationInProgress));

    assert_eq!(auth.validate().await, AuthStatus::Authenticated);
    assert!(auth.last_error().is_none());
}

// =========================================================================
// Signup
// =========================================================================

#[tokio::test]
async fn signup_always_authenticates_even_for_reused_email() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);

    let first = auth.signup("reused@example.com", "longenough", "First").await.unwrap();
    assert_eq!(auth.status(), AuthStatus::Authenticated);
    auth.logout();

    let second = auth.signup("reused@example.com", "longenough", "Second").await.unwrap();
    assert_eq!(auth.status(), AuthStatus::Authenticated);
    assert_eq!(first.user.email, second.user.email);
    assert_ne!(first.user.id, second.user.id);
    assert_eq!(auth.current_user().unwrap().name, "Second");
    assert!(store.read(TOKEN_KEY).unwrap().starts_with("mock-jwt-token-"));
}

// =========================================================================
// Logout
// =========================================================================

#[tokio::test]
async fn logout_clears_session_store_and_error() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    let _ = auth.login("demo@example.com", "bad").await;
    auth.login("demo@example.com", "password").await.unwrap();

    auth.logout();
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
    assert!(auth.current_user().is_none());
    assert!(auth.last_error().is_none());
    assert_eq!(store.read(USER_KEY), None);
    assert_eq!(store.read(TOKEN_KEY), None);
}

#[test]
fn logout_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    auth.logout();
    auth.logout();
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
}

#[test]
fn logout_from_validating_clears_store() {
    let store = seeded_store();
    let auth = controller(&store);
    auth.logout();
    assert_eq!(auth.status(), AuthStatus::Unauthenticated);
    assert_eq!(store.read(TOKEN_KEY), None);
}

// =========================================================================
// Re-validation
// =========================================================================

#[tokio::test]
async fn revalidate_detects_revoked_session() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(MemoryStore::new());
    let auth = AuthController::new(store.clone(), backend.clone());
    auth.login("demo@example.com", "password").await.unwrap();

    assert_eq!(auth.validate().await, AuthStatus::Authenticated);

    backend.reject_verify.store(true, Ordering::SeqCst);
    assert_eq!(auth.validate().await, AuthStatus::Unauthenticated);
    assert!(auth.current_user().is_none());
    assert_eq!(store.read(TOKEN_KEY), None);
}

#[tokio::test]
async fn subscribers_observe_authentication() {
    let store = Arc::new(MemoryStore::new());
    let auth = controller(&store);
    let rx = auth.subscribe();
    assert_eq!(*rx.borrow(), AuthPhase::Unauthenticated);

    auth.login("demo@example.com", "password").await.unwrap();
    assert_eq!(*rx.borrow(), AuthPhase::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn validation_waits_for_simulated_latency() {
    let auth = AuthController::new(seeded_store(), Arc::new(DemoBackend::default()));
    let started = tokio::time::Instant::now();
    auth.validate().await;
    assert!(started.elapsed() >= Duration::from_millis(500));
}
