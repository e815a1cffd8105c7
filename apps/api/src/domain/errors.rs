use chrono::{DateTime, Utc};
use thiserror::Error;

/// Outcomes that stop a governed operation.
///
/// Every variant is scoped to one request; none of them is fatal to the
/// process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// The field category is not editable now. `next_eligible_at` is `None`
    /// when it will never become editable again.
    #[error("{reason}")]
    PolicyViolation {
        reason: String,
        next_eligible_at: Option<DateTime<Utc>>,
    },

    #[error("Daily contact limit reached ({quota} per day). Try again tomorrow.")]
    QuotaExceeded { quota: u32 },

    #[error("Invalid premium duration: {0} days (allowed: 7, 30, 90, 180, 365)")]
    InvalidDuration(i64),

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("A password reset was already requested in the last 24 hours. Try again tomorrow.")]
    AlreadyRequestedToday,

    #[error("{0} not found")]
    NotFound(String),

    /// A conditional update lost a race against a concurrent writer.
    #[error("The record was modified concurrently, please retry")]
    StorageConflict,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Failures outside storage, such as password hashing.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }
}
