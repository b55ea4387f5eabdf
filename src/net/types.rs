//! Shared DTOs for the session core and the upstream REST boundary.
//!
//! DESIGN
//! ======
//! `User` and `Session` are persisted into the session store as JSON, so
//! their serde shape is part of the on-disk contract. The REST DTOs mirror
//! the demo backend's camelCase payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account role carried on every user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::User => f.write_str("user"),
        }
    }
}

/// Identity of the signed-in account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque user identifier.
    pub id: String,
    /// Login email, unique per account.
    pub email: String,
    /// Name shown in headers and greetings.
    pub name: String,
    /// Avatar image URL, if available.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "avatar")]
    pub avatar_url: Option<String>,
    pub role: Role,
}

/// Opaque bearer capability. Never parsed, never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// An authenticated identity bound to this installation.
///
/// Exists only when both halves are present; the store helpers treat a
/// stored user without a token (or the reverse) as no session at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: SessionToken,
}

/// A blog post from the demo REST backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub body: String,
}

/// Payload for creating a post (the server assigns `id`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: u64,
    pub id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
