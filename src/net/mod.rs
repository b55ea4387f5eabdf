//! Network-facing types and the upstream REST client.

pub mod api;
pub mod types;
