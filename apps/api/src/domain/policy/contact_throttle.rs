use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::user::{ContactCounter, UserProfile};

pub const DEFAULT_FREE_QUOTA: u32 = 2;
pub const DEFAULT_PREMIUM_QUOTA: u32 = 10;

/// Daily WhatsApp contact allowance per plan.
///
/// Tunable by the operator; see `AppConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQuotas {
    pub free: u32,
    pub premium: u32,
}

impl Default for ContactQuotas {
    fn default() -> Self {
        Self {
            free: DEFAULT_FREE_QUOTA,
            premium: DEFAULT_PREMIUM_QUOTA,
        }
    }
}

impl ContactQuotas {
    pub fn for_plan(&self, premium: bool) -> u32 {
        if premium {
            self.premium
        } else {
            self.free
        }
    }
}

/// Contact throttling with a lazy reset at the local day boundary.
///
/// No scheduled job clears counters: a counter whose `last_reset` falls on an
/// earlier calendar day (in `day_offset`) is read as zero.
#[derive(Debug, Clone, Copy)]
pub struct ContactPolicy {
    pub quotas: ContactQuotas,
    pub day_offset: FixedOffset,
}

/// Snapshot of a user's allowance at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUsage {
    pub used: u32,
    pub quota: u32,
    pub remaining: u32,
}

impl ContactPolicy {
    pub fn new(quotas: ContactQuotas, day_offset: FixedOffset) -> Self {
        Self { quotas, day_offset }
    }

    /// True when `now` is on a later calendar day than `last_reset`.
    pub fn is_new_day(&self, last_reset: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.with_timezone(&self.day_offset).date_naive()
            > last_reset.with_timezone(&self.day_offset).date_naive()
    }

    pub fn quota(&self, user: &UserProfile, now: DateTime<Utc>) -> u32 {
        self.quotas.for_plan(user.has_active_premium(now))
    }

    /// Contacts counted against today, after any pending logical reset.
    pub fn effective_count(&self, user: &UserProfile, now: DateTime<Utc>) -> u32 {
        if self.is_new_day(user.contacts.last_reset, now) {
            0
        } else {
            user.contacts.count
        }
    }

    pub fn can_contact(&self, user: &UserProfile, now: DateTime<Utc>) -> bool {
        self.effective_count(user, now) < self.quota(user, now)
    }

    pub fn usage(&self, user: &UserProfile, now: DateTime<Utc>) -> ContactUsage {
        let used = self.effective_count(user, now);
        let quota = self.quota(user, now);
        ContactUsage {
            used,
            quota,
            remaining: quota.saturating_sub(used),
        }
    }

    /// Computes the counter after one more contact.
    ///
    /// Resets first on a new day, then increments. Fails with
    /// [`DomainError::QuotaExceeded`] instead of going past the quota; the
    /// caller must store the result with a conditional write against the
    /// counter it read.
    pub fn record_contact(&self, user: &UserProfile, now: DateTime<Utc>) -> DomainResult<ContactCounter> {
        let quota = self.quota(user, now);
        let (count, last_reset) = if self.is_new_day(user.contacts.last_reset, now) {
            (0, now)
        } else {
            (user.contacts.count, user.contacts.last_reset)
        };

        if count >= quota {
            return Err(DomainError::QuotaExceeded { quota });
        }

        Ok(ContactCounter {
            count: count + 1,
            last_reset,
        })
    }
}

impl Default for ContactPolicy {
    fn default() -> Self {
        Self::new(ContactQuotas::default(), maputo_offset())
    }
}

/// Central Africa Time, UTC+2, used across Mozambique.
pub fn maputo_offset() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap_or_else(|| Utc.fix())
}
