//! # Response Envelope
//!
//! Every translator operation resolves to a [`Success`] or a [`Failure`].
//! Route code forwards `statusCode` as the HTTP status and `result` or
//! `error` as the body, unchanged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use super::errors::DatabaseError;

/// Outcome of a translator operation
pub type Envelope = Result<Success, Failure>;

/// Ordered result items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Items {
    pub items: Vec<Value>,
}

/// Success envelope: `{ result: { items }, statusCode }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Success {
    pub result: Items,
    pub status_code: u16,
}

impl Success {
    pub fn new(items: Vec<Value>, status: StatusCode) -> Self {
        Self {
            result: Items { items },
            status_code: status.as_u16(),
        }
    }

    /// 200 OK
    pub fn ok(items: Vec<Value>) -> Self {
        Self::new(items, StatusCode::OK)
    }

    /// 201 Created
    pub fn created(items: Vec<Value>) -> Self {
        Self::new(items, StatusCode::CREATED)
    }

    pub fn items(&self) -> &[Value] {
        &self.result.items
    }
}

impl IntoResponse for Success {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self.result)).into_response()
    }
}

/// Failure envelope: `{ error, statusCode }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub error: String,
    pub status_code: u16,
}

impl From<DatabaseError> for Failure {
    fn from(err: DatabaseError) -> Self {
        Self {
            status_code: err.status_code().as_u16(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.error).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use serde_json::json;

    #[test]
    fn test_success_serialization() {
        let success = Success::created(vec![json!({"id": 4})]);
        let value = serde_json::to_value(&success).unwrap();
        assert_eq!(value, json!({"result": {"items": [{"id": 4}]}, "statusCode": 201}));
    }

    #[test]
    fn test_failure_from_error() {
        let failure = Failure::from(DatabaseError::Store(StoreError::Unavailable(
            "connection refused".to_string(),
        )));
        assert_eq!(failure.status_code, 500);
        assert!(failure.error.contains("connection refused"));

        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["statusCode"], 500);
    }

    #[test]
    fn test_into_response_uses_status_code() {
        let response = Success::created(vec![]).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = Failure::from(DatabaseError::Unsupported("no".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
