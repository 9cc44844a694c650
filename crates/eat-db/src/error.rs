//! Database-specific error types and conversions.

use eat_core::error::EatError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Malformed row: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<DbError> for EatError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EatError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => EatError::AlreadyExists { entity },
            other => EatError::Database(other.to_string()),
        }
    }
}
