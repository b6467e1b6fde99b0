//! mobile-db-shim - a self-hostable stand-in for a mobile backend's database API
//!
//! Requests arrive on the `/mobile/platform/database` routes, get a store
//! handle bound for their lifetime, and are translated into document store
//! operations. Responses use the `{result | error, statusCode}` envelope.
//!
//! Layers, bottom-up:
//! - [`store`]: document store contract plus in-memory and MongoDB backends
//! - [`scope`]: per-request lease of a store handle
//! - [`database`]: verb translator producing envelopes
//! - [`http_server`]: routes, middleware wiring, config
//! - [`cli`]: command-line entry point

pub mod cli;
pub mod database;
pub mod http_server;
pub mod scope;
pub mod store;
