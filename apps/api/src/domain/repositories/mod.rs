// Repository interfaces (ports)
// Implementations live in the infrastructure layer

pub mod feedback_repository;
pub mod user_repository;

pub use feedback_repository::FeedbackRepository;
pub use user_repository::UserRepository;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Failures reported by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A conditional update matched no row because the guarded value changed.
    #[error("conditional update lost a concurrent race")]
    Conflict,

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict => DomainError::StorageConflict,
            RepositoryError::Duplicate(what) => {
                DomainError::Validation(format!("{} already registered", what))
            }
            RepositoryError::NotFound(what) => DomainError::NotFound(what),
            RepositoryError::Database(message) => DomainError::Storage(message),
        }
    }
}
