//! API-facing projections.
//!
//! The types in this module are what routes return, derived from a
//! [`Snapshot`](crate::model::snapshot::Snapshot) rather than stored:
//!
//! - Field names are camelCase.
//! - Datetimes are serialised as RFC 3339 strings.
//! - Votes whose survey no longer exists are dropped from history views.

pub mod account;
pub mod history;
pub mod results;
pub mod survey;
