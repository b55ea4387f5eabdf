//! Long-lived application state shared by views.
//!
//! ARCHITECTURE
//! ============
//! State objects outlive individual views so a view going away mid-request
//! never strands an update.

pub mod auth;
