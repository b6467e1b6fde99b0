//! # Store Errors
//!
//! Failures raised by a backing document store. The translator never lets
//! these escape; they are folded into a failure envelope at its boundary.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Backing store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Store could not be reached or a handle could not be acquired
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Handle was used after its lease was released
    #[error("Store handle already released")]
    Released,

    /// Unique constraint violated
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Document could not be stored as given
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Any other driver failure
    #[error("Store error: {0}")]
    Backend(String),

    /// In-process store lock poisoned
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Whether the failure happened before any work reached the store
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Released)
    }
}

#[cfg(feature = "mongo")]
impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        let message = err.to_string();
        // E11000 is the server's duplicate key code
        if message.contains("E11000") {
            return StoreError::DuplicateKey(message);
        }
        match *err.kind {
            mongodb::error::ErrorKind::ServerSelection { .. }
            | mongodb::error::ErrorKind::Io(_)
            | mongodb::error::ErrorKind::ConnectionPoolCleared { .. } => {
                StoreError::Unavailable(message)
            }
            _ => StoreError::Backend(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::DuplicateKey("_id abc".to_string()).to_string(),
            "Duplicate key: _id abc"
        );
        assert_eq!(StoreError::Released.to_string(), "Store handle already released");
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(StoreError::Unavailable("down".to_string()).is_connectivity());
        assert!(StoreError::Released.is_connectivity());
        assert!(!StoreError::Backend("boom".to_string()).is_connectivity());
    }
}
