//! Database-specific error types and conversions.

use shipyard_core::error::TrackerError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// The store rejected the transaction because a concurrent write
    /// touched the same record. Safe to run again.
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A stored row did not match the expected shape.
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

impl DbError {
    /// Classify a failed statement, separating retryable write
    /// conflicts from other query failures.
    pub(crate) fn from_query(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("transaction conflict")
            || lowered.contains("retry the transaction")
            || lowered.contains("can be retried")
        {
            DbError::Conflict(message)
        } else {
            DbError::Query(message)
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

impl From<DbError> for TrackerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TrackerError::NotFound { entity, id },
            other => TrackerError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_conflicts_are_retryable() {
        let err =
            DbError::from_query("Transaction conflict: Write conflict, retry the transaction");
        assert!(err.is_conflict());

        let err =
            DbError::from_query("Failed to commit transaction. This transaction can be retried");
        assert!(err.is_conflict());
    }

    #[test]
    fn other_failures_are_plain_query_errors() {
        let err = DbError::from_query("Parse error: unexpected token");
        assert!(matches!(err, DbError::Query(_)));
        assert!(!err.is_conflict());
    }
}
