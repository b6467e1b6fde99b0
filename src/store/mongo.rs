//! MongoDB document store.
//!
//! One pooled [`Client`] per connector, created on first acquire. Every
//! acquire pings the configured database so an unreachable server surfaces
//! as an acquisition failure instead of a failed operation mid-request.

use std::sync::Arc;

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::options::{FindOptions, ReplaceOptions};
use mongodb::{Client, Collection, Database};
use serde_json::Value;
use tokio::sync::OnceCell;

use super::errors::{StoreError, StoreResult};
use super::filter::{Filter, Projection, INTERNAL_ID, PRIMARY_KEY};
use super::{DocumentStore, StoreConnector, StoreFuture, StoreHandle};

/// Store over one MongoDB database
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

fn filter_document(filter: &Filter) -> Document {
    let mut query = Document::new();
    if let Filter::IdEquals(id) = filter {
        query.insert(PRIMARY_KEY, *id);
    }
    query
}

fn projection_document(projection: &Projection) -> Document {
    let mut fields = Document::new();
    for field in projection.fields() {
        fields.insert(field.clone(), 1);
    }
    if !projection.includes_internal_id() {
        fields.insert(INTERNAL_ID, 0);
    }
    fields
}

fn to_document(value: &Value) -> StoreResult<Document> {
    bson::to_document(value).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

fn to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

impl DocumentStore for MongoStore {
    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        projection: Option<&'a Projection>,
    ) -> StoreFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let mut options = FindOptions::default();
            options.projection = projection.map(projection_document);

            let cursor = self
                .collection(collection)
                .find(filter_document(filter), options)
                .await?;
            let documents: Vec<Document> = cursor.try_collect().await?;

            Ok(documents.into_iter().map(to_json).collect())
        })
    }

    fn insert_many<'a>(
        &'a self,
        collection: &'a str,
        documents: Vec<Value>,
    ) -> StoreFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let mut prepared = Vec::with_capacity(documents.len());
            for value in &documents {
                let mut document = to_document(value)?;
                if !document.contains_key(INTERNAL_ID) {
                    document.insert(INTERNAL_ID, ObjectId::new());
                }
                prepared.push(document);
            }

            self.collection(collection)
                .insert_many(prepared.iter(), None)
                .await?;

            Ok(prepared.into_iter().map(to_json).collect())
        })
    }

    fn delete_one<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.collection(collection)
                .delete_one(filter_document(filter), None)
                .await?;
            Ok(())
        })
    }

    fn upsert_one<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        replacement: Value,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut document = to_document(&replacement)?;
            // _id is immutable on replace
            document.remove(INTERNAL_ID);

            let mut options = ReplaceOptions::default();
            options.upsert = Some(true);

            self.collection(collection)
                .replace_one(filter_document(filter), document, options)
                .await?;
            Ok(())
        })
    }
}

/// Connector holding one lazily created client
pub struct MongoConnector {
    url: String,
    db_name: String,
    client: OnceCell<Client>,
}

impl MongoConnector {
    pub fn new(url: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            db_name: db_name.into(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> StoreResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                Client::with_uri_str(&self.url)
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))
            })
            .await
    }
}

impl StoreConnector for MongoConnector {
    fn acquire(&self) -> StoreFuture<'_, StoreHandle> {
        Box::pin(async move {
            let client = self.client().await?;
            let db = client.database(&self.db_name);
            db.run_command(doc! { "ping": 1 }, None)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            let handle: StoreHandle = Arc::new(MongoStore::new(db));
            Ok(handle)
        })
    }

    fn release(&self, handle: StoreHandle) {
        // Connections return to the client's pool when the handle drops
        drop(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_document() {
        assert_eq!(filter_document(&Filter::All), Document::new());
        assert_eq!(filter_document(&Filter::IdEquals(3)), doc! { "id": 3_i64 });
    }

    #[test]
    fn test_projection_document_hides_internal_id() {
        let projection = Projection::parse("name,rating").unwrap();
        assert_eq!(
            projection_document(&projection),
            doc! { "name": 1, "rating": 1, "_id": 0 }
        );

        let projection = Projection::parse("_id,name").unwrap();
        assert_eq!(projection_document(&projection), doc! { "_id": 1, "name": 1 });
    }
}
