//! Authentication error types.

use eat_core::error::EatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for EatError {
    fn from(err: AuthError) -> Self {
        match err {
            // Every credential failure surfaces the same message so a
            // caller cannot probe for account existence or state.
            AuthError::InvalidCredentials => EatError::AuthenticationFailed {
                reason: "invalid credentials".into(),
            },
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                EatError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => EatError::Crypto(msg),
        }
    }
}
