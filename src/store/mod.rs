//! # Backing Store
//!
//! The capability set the translator consumes from a document store:
//! find, insert many, delete one, upsert one. Handles are handed out by a
//! [`StoreConnector`] so the connection-scoping layer can acquire and
//! release them per request.
//!
//! Backends:
//! - [`MemoryStore`] - in-process, insertion ordered (default, tests)
//! - `MongoStore` - MongoDB driver (feature `mongo`)

pub mod errors;
pub mod filter;
pub mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

pub use errors::{StoreError, StoreResult};
pub use filter::{strip_internal_id, Filter, Projection, INTERNAL_ID, PRIMARY_KEY};
pub use memory::{MemoryConnector, MemoryStore};
#[cfg(feature = "mongo")]
pub use mongo::{MongoConnector, MongoStore};

/// Boxed future returned by store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Shared store handle
pub type StoreHandle = Arc<dyn DocumentStore>;

/// Operations a backing document store must provide
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter`, in the store's natural order
    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        projection: Option<&'a Projection>,
    ) -> StoreFuture<'a, Vec<Value>>;

    /// Insert documents in order, returning them as stored
    fn insert_many<'a>(
        &'a self,
        collection: &'a str,
        documents: Vec<Value>,
    ) -> StoreFuture<'a, Vec<Value>>;

    /// Delete the first document matching `filter`, if any
    fn delete_one<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> StoreFuture<'a, ()>;

    /// Replace the first document matching `filter`, inserting when none does
    fn upsert_one<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        replacement: Value,
    ) -> StoreFuture<'a, ()>;
}

/// Source of store handles
pub trait StoreConnector: Send + Sync {
    /// Acquire a handle (a fresh one or a pooled one)
    fn acquire(&self) -> StoreFuture<'_, StoreHandle>;

    /// Give a handle back. Must not fail.
    fn release(&self, handle: StoreHandle);
}
