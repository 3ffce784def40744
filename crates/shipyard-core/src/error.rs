//! Error types for the Shipyard tracker.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("You must be logged in")]
    Unauthenticated,

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
