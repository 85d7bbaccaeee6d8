// lib/src/errors.rs

use bcrypt::BcryptError;
use rmp_serde::decode::Error as RmpDecodeError;
use rmp_serde::encode::Error as RmpEncodeError;
use sled::transaction::TransactionError;
use thiserror::Error;

use models::errors::{FieldErrors, ModelError, TransitionError};
use models::RecordId;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization/Deserialization error: {0}")]
    SerializationError(String),

    #[error("No {entity} found with id {id}")]
    NotFound { entity: &'static str, id: RecordId },

    #[error("{0}")]
    Validation(#[from] FieldErrors),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Triage advisor error: {0}")]
    Upstream(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHashingError(#[from] BcryptError),
}

pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    pub fn not_found(entity: &'static str, id: RecordId) -> Self {
        TriageError::NotFound { entity, id }
    }
}

impl From<ModelError> for TriageError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(errors) => TriageError::Validation(errors),
            ModelError::Transition(err) => TriageError::InvalidTransition(err),
            ModelError::PasswordHash(err) => TriageError::PasswordHashingError(err),
        }
    }
}

impl From<sled::Error> for TriageError {
    fn from(err: sled::Error) -> Self {
        TriageError::DatabaseError(err.to_string())
    }
}

impl From<RmpEncodeError> for TriageError {
    fn from(err: RmpEncodeError) -> Self {
        TriageError::SerializationError(err.to_string())
    }
}

impl From<RmpDecodeError> for TriageError {
    fn from(err: RmpDecodeError) -> Self {
        TriageError::SerializationError(err.to_string())
    }
}

impl From<TransactionError<TriageError>> for TriageError {
    fn from(err: TransactionError<TriageError>) -> Self {
        match err {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => err.into(),
        }
    }
}

impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        TriageError::Upstream(err.to_string())
    }
}
