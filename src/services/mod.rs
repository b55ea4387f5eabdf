//! Backend-facing services used by the auth controller.
//!
//! ARCHITECTURE
//! ============
//! Service modules own remote and timing concerns so the controller can
//! stay focused on state transitions.

pub mod auth;
