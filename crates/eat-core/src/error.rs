//! Error types for the EAT system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EatError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Deliberately carries no detail about which role or grant would
    /// have been sufficient.
    #[error("not authorized")]
    AuthorizationDenied,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EatResult<T> = Result<T, EatError>;
