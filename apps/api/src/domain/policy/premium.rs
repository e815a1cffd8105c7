use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::user::PremiumState;

/// Plan in force at a given instant.
///
/// # States
/// ```text
/// Free --promote--> PremiumActive --expiry passes--> PremiumExpired --sweep--> Free
///                         └------------demote------------------------------------^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanState {
    Free,
    PremiumActive,
    /// Still flagged premium but past its expiry; treated as free.
    PremiumExpired,
}

pub fn plan_state(premium: &PremiumState, now: DateTime<Utc>) -> PlanState {
    match (premium.is_premium, premium.expires_at) {
        (false, _) => PlanState::Free,
        (true, Some(expires_at)) if expires_at < now => PlanState::PremiumExpired,
        (true, _) => PlanState::PremiumActive,
    }
}

/// Promotion lengths an admin may grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PremiumDuration {
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
}

impl PremiumDuration {
    pub fn days(self) -> i64 {
        match self {
            PremiumDuration::Week => 7,
            PremiumDuration::Month => 30,
            PremiumDuration::Quarter => 90,
            PremiumDuration::HalfYear => 180,
            PremiumDuration::Year => 365,
        }
    }
}

impl TryFrom<i64> for PremiumDuration {
    type Error = DomainError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(PremiumDuration::Week),
            30 => Ok(PremiumDuration::Month),
            90 => Ok(PremiumDuration::Quarter),
            180 => Ok(PremiumDuration::HalfYear),
            365 => Ok(PremiumDuration::Year),
            other => Err(DomainError::InvalidDuration(other)),
        }
    }
}

/// Premium fields after an admin grants `duration` at `now`.
pub fn promote(duration: PremiumDuration, admin_id: Uuid, now: DateTime<Utc>) -> PremiumState {
    PremiumState {
        is_premium: true,
        expires_at: Some(now + Duration::days(duration.days())),
        promoted_by: Some(admin_id),
    }
}

/// Premium fields after a demotion or an expiry sweep.
pub fn demote() -> PremiumState {
    PremiumState::default()
}

/// The expiry the sweep should key its conditional update on, if the grant
/// has lapsed at `now`.
pub fn lapsed_expiry(premium: &PremiumState, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    premium.expires_at.filter(|expires_at| *expires_at < now)
}
