//! Request scope.
//!
//! The value route handlers receive (as an axum `Extension`) instead of a
//! capability patched onto the request: the request id plus the
//! [`Database`] bound to this request's lease.

use uuid::Uuid;

use crate::database::Database;

/// Request-scoped database context
#[derive(Debug, Clone)]
pub struct RequestScope {
    request_id: Uuid,
    database: Database,
}

impl RequestScope {
    pub fn new(database: Database) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            database,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Translator bound to this request
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Release the underlying store handle
    pub fn release(&self) {
        self.database.lease().release();
    }
}
