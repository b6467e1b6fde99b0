//! In-memory document store.
//!
//! Each collection is an insertion-ordered list, so `find` enumerates in
//! the order documents were first written. Every stored document carries a
//! UUID `_id` assigned on insert.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::filter::{Filter, Projection, INTERNAL_ID};
use super::{DocumentStore, StoreConnector, StoreFuture, StoreHandle};

/// Collection name -> documents in insertion order
type Collections = HashMap<String, Vec<Value>>;

/// In-process document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> StoreResult<usize> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).map(Vec::len).unwrap_or(0))
    }

    fn find_sync(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;

        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .map(|doc| match projection {
                        Some(p) => p.apply(doc),
                        None => doc,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(docs)
    }

    fn insert_many_sync(&self, collection: &str, documents: Vec<Value>) -> StoreResult<Vec<Value>> {
        // Validate the whole batch before touching the collection
        let mut prepared = Vec::with_capacity(documents.len());
        for doc in documents {
            prepared.push(with_internal_id(into_object(doc)?));
        }

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let docs = collections.entry(collection.to_string()).or_default();

        for (idx, doc) in prepared.iter().enumerate() {
            let internal_id = &doc[INTERNAL_ID];
            let taken = docs.iter().any(|d| &d[INTERNAL_ID] == internal_id)
                || prepared[..idx].iter().any(|d| &d[INTERNAL_ID] == internal_id);
            if taken {
                return Err(StoreError::DuplicateKey(format!(
                    "{} {} in collection {}",
                    INTERNAL_ID, internal_id, collection
                )));
            }
        }

        docs.extend(prepared.iter().cloned());
        Ok(prepared)
    }

    fn delete_one_sync(&self, collection: &str, filter: &Filter) -> StoreResult<()> {
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;

        if let Some(docs) = collections.get_mut(collection) {
            if let Some(pos) = docs.iter().position(|doc| filter.matches(doc)) {
                docs.remove(pos);
            }
        }

        Ok(())
    }

    fn upsert_one_sync(&self, collection: &str, filter: &Filter, replacement: Value) -> StoreResult<()> {
        let mut replacement = into_object(replacement)?;

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let docs = collections.entry(collection.to_string()).or_default();

        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(pos) => {
                // Replacement keeps the identity of the document it replaces
                let internal_id = docs[pos][INTERNAL_ID].clone();
                replacement.insert(INTERNAL_ID.to_string(), internal_id);
                docs[pos] = Value::Object(replacement);
            }
            None => {
                replacement.remove(INTERNAL_ID);
                docs.push(with_internal_id(replacement));
            }
        }

        Ok(())
    }
}

fn into_object(doc: Value) -> StoreResult<Map<String, Value>> {
    match doc {
        Value::Object(obj) => Ok(obj),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn with_internal_id(mut obj: Map<String, Value>) -> Value {
    obj.entry(INTERNAL_ID.to_string())
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    Value::Object(obj)
}

impl DocumentStore for MemoryStore {
    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        projection: Option<&'a Projection>,
    ) -> StoreFuture<'a, Vec<Value>> {
        Box::pin(async move { self.find_sync(collection, filter, projection) })
    }

    fn insert_many<'a>(
        &'a self,
        collection: &'a str,
        documents: Vec<Value>,
    ) -> StoreFuture<'a, Vec<Value>> {
        Box::pin(async move { self.insert_many_sync(collection, documents) })
    }

    fn delete_one<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.delete_one_sync(collection, filter) })
    }

    fn upsert_one<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        replacement: Value,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.upsert_one_sync(collection, filter, replacement) })
    }
}

/// Hands out the same shared [`MemoryStore`] to every request
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector over an existing store
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }
}

impl StoreConnector for MemoryConnector {
    fn acquire(&self) -> StoreFuture<'_, StoreHandle> {
        let handle: StoreHandle = self.store.clone();
        Box::pin(async move { Ok(handle) })
    }

    fn release(&self, handle: StoreHandle) {
        drop(handle);
    }
}
