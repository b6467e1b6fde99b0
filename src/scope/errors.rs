//! Scope errors.
//!
//! The only failures allowed past the translator boundary: no handle could
//! be acquired, or the request outlived its timeout.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Connection-scoping failures
#[derive(Debug, Clone, Error)]
pub enum ScopeError {
    /// No store handle could be acquired; the route never ran
    #[error("Could not acquire a database handle: {0}")]
    Acquisition(StoreError),

    /// Route did not finish in time
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ScopeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScopeError::Acquisition(_) => StatusCode::SERVICE_UNAVAILABLE,
            ScopeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeErrorResponse {
    pub error: String,
    pub status_code: u16,
}

impl IntoResponse for ScopeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ScopeErrorResponse {
            error: self.to_string(),
            status_code: status.as_u16(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ScopeError::Acquisition(StoreError::Unavailable("down".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ScopeError::Timeout(Duration::from_millis(5)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = ScopeError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Request timed out after 1500ms");
    }
}
