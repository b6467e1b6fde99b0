//! # HTTP Server Module
//!
//! Axum dispatcher for the database shim.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/mobile/platform/database/objects/:table` - getAll (GET), insert (POST), merge (PUT)
//! - `/mobile/platform/database/objects/:table/:keys` - get (GET), delete (DELETE)
//! - `/mobile/platform/database/sql` - sql (POST, always 501)

pub mod config;
pub mod routes;
pub mod server;

pub use config::{ConfigError, ShimConfig, StoreKind};
pub use routes::{database_routes, health_routes};
pub use server::{connector_for, ShimServer};
