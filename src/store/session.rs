//! Durable key-value persistence for the current session.
//!
//! ARCHITECTURE
//! ============
//! The store is a dumb string map. Two keys hold the session: `auth_user`
//! (the user serialized as JSON) and `auth_token` (the raw token). Only the
//! auth controller writes them; everything else reads derived status.
//!
//! ERROR HANDLING
//! ==============
//! Store operations never fail from the caller's point of view. An
//! unreadable or unwritable backing file degrades to "absent" and is logged,
//! matching how a browser treats disabled local storage.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::net::types::{Session, User};

/// Store key holding the serialized user.
pub const USER_KEY: &str = "auth_user";
/// Store key holding the opaque session token.
pub const TOKEN_KEY: &str = "auth_token";

/// Client-side durable storage, scoped to one installation.
pub trait SessionStore: Send + Sync {
    /// Last written value for `key`, or `None` if never written or unavailable.
    fn read(&self, key: &str) -> Option<String>;

    /// Persist `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str);

    /// Remove `key`; subsequent reads return `None`.
    fn clear(&self, key: &str);

    /// Whether writes can be expected to persist at all.
    fn is_available(&self) -> bool {
        true
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process store. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    disabled: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that behaves like storage disabled by the environment:
    /// reads are always absent and writes are dropped.
    #[must_use]
    pub fn disabled() -> Self {
        Self { entries: Mutex::new(HashMap::new()), disabled: true }
    }
}

impl SessionStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        if self.disabled {
            return None;
        }
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        if self.disabled {
            return;
        }
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
    }

    fn clear(&self, key: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
    }

    fn is_available(&self) -> bool {
        !self.disabled
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file store that survives process restarts.
///
/// The whole map is rewritten on every mutation through a temp file and a
/// rename, so a crash mid-write leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session store unreadable");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "session store corrupt; treating as empty");
            BTreeMap::new()
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let rendered = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(&rendered)?;
        file.sync_all()?;
        std::fs::rename(&tmp, &self.path)
    }

    fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.load();
        if !apply(&mut entries) {
            return;
        }
        if let Err(e) = self.persist(&entries) {
            tracing::warn!(path = %self.path.display(), error = %e, "session store write failed");
        }
    }
}

impl SessionStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.load().remove(key)
    }

    fn write(&self, key: &str, value: &str) {
        self.mutate(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            true
        });
    }

    fn clear(&self, key: &str) {
        self.mutate(|entries| entries.remove(key).is_some());
    }
}

// =============================================================================
// SESSION HELPERS
// =============================================================================

/// Raw session halves as found in the store, before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredSession {
    /// Nothing usable stored. Partial state (one key only) lands here too.
    Absent,
    /// Both keys present; contents not yet checked.
    Present { user: String, token: String },
}

impl StoredSession {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// Read both session keys. Partial state is reported as absent.
#[must_use]
pub fn read_session(store: &dyn SessionStore) -> StoredSession {
    match (store.read(USER_KEY), store.read(TOKEN_KEY)) {
        (Some(user), Some(token)) => StoredSession::Present { user, token },
        _ => StoredSession::Absent,
    }
}

/// Persist both halves of `session`.
///
/// # Errors
///
/// Returns an error if the user cannot be serialized.
pub fn write_session(store: &dyn SessionStore, session: &Session) -> Result<(), serde_json::Error> {
    let user = serde_json::to_string(&session.user)?;
    store.write(USER_KEY, &user);
    store.write(TOKEN_KEY, session.token.expose());
    Ok(())
}

/// Remove both session keys.
pub fn clear_session(store: &dyn SessionStore) {
    store.clear(USER_KEY);
    store.clear(TOKEN_KEY);
}

/// Decode a stored user value.
///
/// # Errors
///
/// Returns an error if the stored text is not a serialized `User`.
pub fn decode_user(raw: &str) -> Result<User, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
