use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Participant '{0}' already exists")]
    DuplicateName(String),

    #[error("Participant {0} not found")]
    ParticipantNotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    /// Failures that leave no trace once the surrounding transaction rolled
    /// back, so the whole unit of work can be attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Database(sqlx::Error::Database(e)) => {
                matches!(e.code().as_deref(), Some("40001") | Some("40P01"))
            }
            StorageError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_retryable() {
        let err = StorageError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_domain_errors_are_not_retryable() {
        assert!(!StorageError::InvalidName("empty".into()).is_retryable());
        assert!(!StorageError::DuplicateName("Alice".into()).is_retryable());
        assert!(!StorageError::ParticipantNotFound(Uuid::nil()).is_retryable());
        assert!(!StorageError::from(sqlx::Error::RowNotFound).is_retryable());
    }
}
