//! The operations the HTTP layer exposes, as async functions over a
//! [`Store`](crate::store::Store).
//!
//! Anything that changes data runs inside [`Store::transact`], so concurrent
//! requests never lose each other's writes. Operations that act on behalf of
//! someone take the [`Caller`](crate::model::auth::Caller) explicitly.

pub mod seed;
pub mod surveys;
pub mod users;
