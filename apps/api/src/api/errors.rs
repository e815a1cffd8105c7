use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::DomainError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Set for edit-policy denials that reopen later.
    pub next_eligible_at: Option<DateTime<Utc>>,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            next_eligible_at: None,
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.next_eligible_at {
            Some(at) => json!({ "message": self.message, "nextEligibleAt": at }),
            None => json!({ "message": self.message }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match &err {
            DomainError::PolicyViolation { next_eligible_at, .. } => {
                return Self {
                    status: StatusCode::CONFLICT,
                    message: err.to_string(),
                    next_eligible_at: *next_eligible_at,
                };
            }
            DomainError::QuotaExceeded { .. } | DomainError::AlreadyRequestedToday => {
                StatusCode::TOO_MANY_REQUESTS
            }
            DomainError::InvalidDuration(_)
            | DomainError::Validation(_)
            | DomainError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::StorageConflict => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Storage(_) | DomainError::Internal(_) => {
                tracing::error!(error = %err, "Request failed");
                return Self::internal_server_error("Internal server error");
            }
        };

        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn policy_violation_carries_next_eligible_at() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let err = ApiError::from(DomainError::PolicyViolation {
            reason: "Salary level can only change every 2 years".to_string(),
            next_eligible_at: Some(at),
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.next_eligible_at, Some(at));
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (DomainError::QuotaExceeded { quota: 2 }, StatusCode::TOO_MANY_REQUESTS),
            (DomainError::AlreadyRequestedToday, StatusCode::TOO_MANY_REQUESTS),
            (DomainError::InvalidDuration(14), StatusCode::BAD_REQUEST),
            (DomainError::InvalidOrExpiredToken, StatusCode::BAD_REQUEST),
            (DomainError::not_found("User"), StatusCode::NOT_FOUND),
            (DomainError::StorageConflict, StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (DomainError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let err = ApiError::from(DomainError::Storage("connection refused".into()));
        assert_eq!(err.message, "Internal server error");
    }
}
