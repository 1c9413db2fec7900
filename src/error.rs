//! Errors returned by the domain services (`accounts`, `donors`, `urgent`).

use crate::core_state::CoreError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<CryptoError> for ServiceError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::WrongPassword => ServiceError::Unauthorized(err.to_string()),
            CryptoError::PasswordTooShort { .. } => ServiceError::Validation(ValidationError::Invalid {
                field: "password",
                reason: err.to_string(),
            }),
            CryptoError::CorruptedCredentials => {
                ServiceError::Database(DatabaseError::ConstraintViolation(err.to_string()))
            }
        }
    }
}
