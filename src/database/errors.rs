//! # Database Errors
//!
//! Everything that can go wrong inside a translator operation, and the
//! status code each failure is reported with.

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for translator internals
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// One upsert that failed during a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFailure {
    pub id: i64,
    pub error: StoreError,
}

/// Translator errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseError {
    // ==================
    // Validation (500, store never touched)
    // ==================
    /// Caller input failed a precondition
    #[error("Validation error: {0}")]
    Validation(String),

    /// Key string names more than one primary key
    #[error("Composite primary keys are not supported, only a single `id`: '{0}'")]
    UnsupportedKeyShape(String),

    /// Key string is not a single integer
    #[error("Primary key `id` must be an integer, got '{0}'")]
    InvalidKey(String),

    // ==================
    // Store (500)
    // ==================
    /// Backing store operation failed
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Some upserts of a merge failed
    #[error("Merge failed for {}", describe_failures(.failures))]
    MergeFailed { failures: Vec<MergeFailure> },

    // ==================
    // Unsupported (501)
    // ==================
    /// Operation the shim will never execute
    #[error("{0}")]
    Unsupported(String),
}

impl DatabaseError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DatabaseError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was raised before any store call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DatabaseError::Validation(_)
                | DatabaseError::UnsupportedKeyShape(_)
                | DatabaseError::InvalidKey(_)
        )
    }
}

fn describe_failures(failures: &[MergeFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("id {} ({})", f.id, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}
