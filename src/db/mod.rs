pub mod repository;
pub mod sqlite;
pub mod store;

pub use repository::*;
pub use sqlite::*;
pub use store::*;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Unknown {field} value: {value}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("Migration to schema v{version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },

    /// A stored column could not be decoded.
    #[error("Unreadable stored value: {0}")]
    InvalidValue(String),
}
