//! Client-side durable storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Plays the part local storage plays in a browser: a per-installation
//! string map that outlives the process.

pub mod session;
