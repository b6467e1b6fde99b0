//! # Translator
//!
//! Maps the five verbs of the mobile database API onto the backing store
//! and shapes every outcome into an [`Envelope`]. Nothing escapes an
//! operation as an error value other than a [`Failure`].

use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::scope::StoreLease;
use crate::store::{strip_internal_id, DocumentStore, Filter, Projection, PRIMARY_KEY};

use super::envelope::{Envelope, Failure, Success};
use super::errors::{DatabaseError, DatabaseResult, MergeFailure};
use super::key::PrimaryKey;
use super::options::QueryOptions;

const SQL_UNSUPPORTED: &str =
    "SQL queries are not supported; use insert, getAll, get, delete or merge";

/// Database API bound to one request's store lease
#[derive(Debug, Clone)]
pub struct Database {
    lease: Arc<StoreLease>,
    legacy_key_fallback: bool,
}

impl Database {
    pub fn new(lease: Arc<StoreLease>) -> Self {
        Self {
            lease,
            legacy_key_fallback: false,
        }
    }

    /// Let `get` read the whole collection when the key does not parse
    pub fn with_legacy_key_fallback(mut self, enabled: bool) -> Self {
        self.legacy_key_fallback = enabled;
        self
    }

    pub fn lease(&self) -> &Arc<StoreLease> {
        &self.lease
    }

    /// Insert documents; echoes each document's `id` with 201
    pub async fn insert(&self, collection: &str, docs: Vec<Value>) -> Envelope {
        debug!(collection, count = docs.len(), "insert");
        let outcome = self.try_insert(collection, docs).await;
        finish("insert", collection, outcome.map(Success::created))
    }

    /// Every document in the collection, optionally projected
    pub async fn get_all(&self, collection: &str, options: &QueryOptions) -> Envelope {
        debug!(collection, fields = ?options.fields, "getAll");
        let outcome = self.try_find(collection, Filter::All, options).await;
        finish("getAll", collection, outcome.map(Success::ok))
    }

    /// Documents whose `id` equals the key (zero or one)
    pub async fn get(&self, collection: &str, keys: &str, options: &QueryOptions) -> Envelope {
        debug!(collection, keys, "get");
        let outcome = match self.key_filter(keys, options) {
            Ok(filter) => self.try_find(collection, filter, options).await,
            Err(err) => Err(err),
        };
        finish("get", collection, outcome.map(Success::ok))
    }

    /// Delete the document whose `id` equals the key; echoes the key
    pub async fn delete(&self, collection: &str, keys: &str) -> Envelope {
        debug!(collection, keys, "delete");
        let outcome = self.try_delete(collection, keys).await;
        finish("delete", collection, outcome.map(Success::ok))
    }

    /// Upsert each document by `id`, replacing whole documents
    pub async fn merge(&self, collection: &str, docs: Vec<Value>, options: &QueryOptions) -> Envelope {
        debug!(collection, count = docs.len(), "merge");
        let outcome = self.try_merge(collection, docs, options).await;
        finish("merge", collection, outcome.map(Success::ok))
    }

    /// Structured queries are never executed
    pub async fn sql(&self, query: &str, args: &[Value]) -> Envelope {
        debug!(query, args = args.len(), "sql rejected");
        Err(Failure::from(DatabaseError::Unsupported(SQL_UNSUPPORTED.to_string())))
    }

    async fn try_insert(&self, collection: &str, docs: Vec<Value>) -> DatabaseResult<Vec<Value>> {
        if let Some(pos) = docs.iter().position(|d| !d.is_object()) {
            return Err(DatabaseError::Validation(format!(
                "document at position {} is not a JSON object",
                pos
            )));
        }
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let store = self.lease.store()?;
        let inserted = store.insert_many(collection, docs).await?;

        Ok(inserted.iter().map(key_echo).collect())
    }

    async fn try_find(
        &self,
        collection: &str,
        filter: Filter,
        options: &QueryOptions,
    ) -> DatabaseResult<Vec<Value>> {
        let projection = options.projection();

        let store = self.lease.store()?;
        let docs = store.find(collection, &filter, projection.as_ref()).await?;

        Ok(docs
            .into_iter()
            .map(|doc| finalize(doc, projection.as_ref()))
            .collect())
    }

    fn key_filter(&self, keys: &str, options: &QueryOptions) -> DatabaseResult<Filter> {
        options.check_primary_keys()?;

        match PrimaryKey::parse(keys) {
            Ok(key) => Ok(Filter::IdEquals(key.value())),
            Err(err) if self.legacy_key_fallback => {
                debug!(keys, error = %err, "unparsable key, reading whole collection");
                Ok(Filter::All)
            }
            Err(err) => Err(err),
        }
    }

    async fn try_delete(&self, collection: &str, keys: &str) -> DatabaseResult<Vec<Value>> {
        let key = PrimaryKey::parse(keys).map_err(|err| {
            DatabaseError::Validation(format!(
                "only deletion by primary key `{}` is supported ({})",
                PRIMARY_KEY, err
            ))
        })?;

        let store = self.lease.store()?;
        store
            .delete_one(collection, &Filter::IdEquals(key.value()))
            .await?;

        Ok(vec![json!({ PRIMARY_KEY: key.value() })])
    }

    async fn try_merge(
        &self,
        collection: &str,
        docs: Vec<Value>,
        options: &QueryOptions,
    ) -> DatabaseResult<Vec<Value>> {
        options.check_primary_keys()?;

        let mut keyed = Vec::with_capacity(docs.len());
        for (pos, doc) in docs.into_iter().enumerate() {
            let id = doc
                .as_object()
                .and_then(|obj| obj.get(PRIMARY_KEY))
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    DatabaseError::Validation(format!(
                        "document at position {} needs an integer `{}` to merge",
                        pos, PRIMARY_KEY
                    ))
                })?;
            keyed.push((id, doc));
        }
        if keyed.is_empty() {
            return Ok(Vec::new());
        }

        let echoed: Vec<Value> = keyed.iter().map(|(id, _)| json!({ PRIMARY_KEY: id })).collect();

        // Same-id documents apply in input order; distinct ids run concurrently
        let mut groups: Vec<(i64, Vec<Value>)> = Vec::new();
        for (id, doc) in keyed {
            match groups.iter_mut().find(|(gid, _)| *gid == id) {
                Some((_, group)) => group.push(doc),
                None => groups.push((id, vec![doc])),
            }
        }

        let store = self.lease.store()?;
        let store = store.as_ref();
        let outcomes = join_all(
            groups
                .into_iter()
                .map(|(id, group)| upsert_group(store, collection, id, group)),
        )
        .await;

        let failures: Vec<MergeFailure> = outcomes.into_iter().flatten().collect();
        if !failures.is_empty() {
            return Err(DatabaseError::MergeFailed { failures });
        }

        Ok(echoed)
    }
}

async fn upsert_group(
    store: &dyn DocumentStore,
    collection: &str,
    id: i64,
    group: Vec<Value>,
) -> Option<MergeFailure> {
    let filter = Filter::IdEquals(id);
    for doc in group {
        if let Err(error) = store.upsert_one(collection, &filter, doc).await {
            return Some(MergeFailure { id, error });
        }
    }
    None
}

/// `{ id }` of an inserted document, `{}` when it has none
fn key_echo(doc: &Value) -> Value {
    let mut echo = Map::new();
    if let Some(id) = doc.get(PRIMARY_KEY) {
        echo.insert(PRIMARY_KEY.to_string(), id.clone());
    }
    Value::Object(echo)
}

/// Apply the projection and hide the store identifier unless it was asked for
fn finalize(doc: Value, projection: Option<&Projection>) -> Value {
    match projection {
        Some(p) if p.includes_internal_id() => p.apply(doc),
        Some(p) => strip_internal_id(p.apply(doc)),
        None => strip_internal_id(doc),
    }
}

fn finish(verb: &str, collection: &str, outcome: DatabaseResult<Success>) -> Envelope {
    match outcome {
        Ok(success) => {
            debug!(verb, collection, items = success.items().len(), "ok");
            Ok(success)
        }
        Err(err) => {
            warn!(verb, collection, validation = err.is_validation(), error = %err, "failed");
            Err(Failure::from(err))
        }
    }
}
