//! Admin-mediated password reset.
//!
//! A user asks for a reset at most once per 24 hours; an admin issues a
//! single-use token that expires after the configured TTL (one hour by
//! default) and passes the link on; the user redeems it with a new password.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::user::PasswordResetState;

pub const REQUEST_COOLDOWN_HOURS: i64 = 24;
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResetStage {
    NoRequest,
    /// Waiting for an admin to issue a token.
    Requested,
    TokenIssued,
    Expired,
    Consumed,
}

pub fn stage(state: &PasswordResetState, now: DateTime<Utc>) -> ResetStage {
    match (&state.token, state.expires_at) {
        (Some(_), Some(expires_at)) if now > expires_at => ResetStage::Expired,
        (Some(_), _) => ResetStage::TokenIssued,
        (None, _) => match (state.requested_at, state.consumed_at) {
            (None, _) => ResetStage::NoRequest,
            (Some(requested), Some(consumed)) if consumed >= requested => ResetStage::Consumed,
            (Some(_), _) => ResetStage::Requested,
        },
    }
}

/// Rejects a new request made within 24 hours of the previous one.
pub fn check_request_allowed(state: &PasswordResetState, now: DateTime<Utc>) -> DomainResult<()> {
    match state.requested_at {
        Some(previous) if now - previous < Duration::hours(REQUEST_COOLDOWN_HOURS) => {
            Err(DomainError::AlreadyRequestedToday)
        }
        _ => Ok(()),
    }
}

/// A freshly generated token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_token(now: DateTime<Utc>, ttl: Duration) -> IssuedToken {
    IssuedToken {
        token: Uuid::new_v4().simple().to_string(),
        expires_at: now + ttl,
    }
}

/// Checks `presented` against the stored token.
///
/// Valid up to and including `expires_at`.
pub fn verify_token(state: &PasswordResetState, presented: &str, now: DateTime<Utc>) -> DomainResult<()> {
    match (&state.token, state.expires_at) {
        (Some(token), Some(expires_at)) if tokens_match(token, presented) && now <= expires_at => Ok(()),
        _ => Err(DomainError::InvalidOrExpiredToken),
    }
}

fn tokens_match(stored: &str, presented: &str) -> bool {
    stored.len() == presented.len()
        && stored
            .bytes()
            .zip(presented.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
