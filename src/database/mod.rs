//! # Mobile Database API
//!
//! The translator for the five-verb database contract (`insert`, `getAll`,
//! `get`, `delete`, `merge`, plus the always-rejected `sql`) and the
//! response envelope every verb resolves to.
//!
//! Status codes: 200 read/delete/merge, 201 insert, 500 validation or
//! store failure, 501 unsupported operation.

pub mod envelope;
pub mod errors;
pub mod key;
pub mod options;
pub mod translator;

pub use envelope::{Envelope, Failure, Items, Success};
pub use errors::{DatabaseError, DatabaseResult, MergeFailure};
pub use key::PrimaryKey;
pub use options::QueryOptions;
pub use translator::Database;
