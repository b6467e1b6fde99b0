//! # Connection Scoping
//!
//! Per-request lifecycle of a store handle: acquired when a database route
//! is entered, bound to a [`Database`](crate::database::Database) carried in
//! a [`RequestScope`], released when the route returns.

pub mod context;
pub mod errors;
pub mod lease;
pub mod middleware;

pub use context::RequestScope;
pub use errors::ScopeError;
pub use lease::{LeasePhase, StoreLease};
pub use middleware::{bind_database, ScopeState};
