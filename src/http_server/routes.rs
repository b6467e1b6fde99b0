//! Database HTTP Routes
//!
//! The mobile backend's database REST surface. Each handler calls one verb
//! on the request's bound [`Database`](crate::database::Database) and sends
//! the envelope back as-is: `statusCode` becomes the HTTP status, `result`
//! (JSON) or `error` (text) becomes the body.
//!
//! Error bodies come in two formats. A failed verb answers with the bare
//! error message as `text/plain`. When no store handle could be bound (503)
//! or the route timed out (504), the body is JSON `{ error, statusCode }`.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::{Envelope, QueryOptions};
use crate::scope::RequestScope;

/// Prefix of all database routes
pub const DATABASE_PREFIX: &str = "/mobile/platform/database";

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct SqlRequest {
    pub sql: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ==================
// Routers
// ==================

/// Create database routes (expects a [`RequestScope`] extension)
pub fn database_routes() -> Router {
    Router::new()
        .route(
            "/mobile/platform/database/objects/:table",
            get(get_all_handler).post(insert_handler).put(merge_handler),
        )
        .route(
            "/mobile/platform/database/objects/:table/:keys",
            get(get_handler).delete(delete_handler),
        )
        .route("/mobile/platform/database/sql", post(sql_handler))
}

/// Health check route
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// A body may be a single document or an array of them
fn documents(body: Value) -> Vec<Value> {
    match body {
        Value::Array(docs) => docs,
        doc => vec![doc],
    }
}

// ==================
// Handlers
// ==================

async fn get_all_handler(
    Extension(scope): Extension<RequestScope>,
    Path(table): Path<String>,
    Query(options): Query<QueryOptions>,
) -> Envelope {
    scope.database().get_all(&table, &options).await
}

async fn insert_handler(
    Extension(scope): Extension<RequestScope>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> Envelope {
    scope.database().insert(&table, documents(body)).await
}

async fn merge_handler(
    Extension(scope): Extension<RequestScope>,
    Path(table): Path<String>,
    Query(options): Query<QueryOptions>,
    Json(body): Json<Value>,
) -> Envelope {
    scope.database().merge(&table, documents(body), &options).await
}

async fn get_handler(
    Extension(scope): Extension<RequestScope>,
    Path((table, keys)): Path<(String, String)>,
    Query(options): Query<QueryOptions>,
) -> Envelope {
    scope.database().get(&table, &keys, &options).await
}

async fn delete_handler(
    Extension(scope): Extension<RequestScope>,
    Path((table, keys)): Path<(String, String)>,
) -> Envelope {
    scope.database().delete(&table, &keys).await
}

async fn sql_handler(
    Extension(scope): Extension<RequestScope>,
    Json(request): Json<SqlRequest>,
) -> Envelope {
    scope.database().sql(&request.sql, &request.args).await
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
