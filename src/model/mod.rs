//! Persisted records, request bodies and response projections.

pub mod api;
pub mod auth;
pub mod clock;
pub mod id;
pub mod snapshot;
pub mod survey;
pub mod user;
pub mod vote;
