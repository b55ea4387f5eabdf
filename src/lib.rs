//! Session core for the launchpad dashboard.
//!
//! ARCHITECTURE
//! ============
//! - `store`: durable session storage (leaf).
//! - `services`: the auth backend seam and its demo implementation.
//! - `state`: the auth controller, single owner of the session.
//! - `routes`: route table, navigator and the guard in front of protected views.
//! - `pages`: terminal renditions of the views and their form checks.
//! - `net`: DTOs and the upstream REST client.
//! - `config`: environment-driven settings.

pub mod config;
pub mod net;
pub mod pages;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
