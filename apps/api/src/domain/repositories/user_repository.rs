use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::history::LocationHistoryRecord;
use crate::domain::user::{ContactCounter, Grade, Phone, PremiumState, SalaryLevel, UserProfile};

/// Repository trait for the User aggregate
///
/// Every mutating method that guards a read-modify-write takes the value the
/// caller read and must fail with `RepositoryError::Conflict` when the stored
/// value no longer matches, leaving the row untouched.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a taken phone number is `RepositoryError::Duplicate`.
    async fn create(&self, user: &UserProfile) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<UserProfile>>;

    async fn find_by_phone(&self, phone: &Phone) -> RepositoryResult<Option<UserProfile>>;

    /// All users, oldest first.
    async fn list_all(&self) -> RepositoryResult<Vec<UserProfile>>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    /// Write the new location named by `record`, bump the category marker and
    /// `profile_last_updated` to `record.edited_at`, and append `record`, all
    /// or nothing. Guarded on the category marker still being `expected_marker`.
    async fn apply_location_edit(
        &self,
        record: &LocationHistoryRecord,
        expected_marker: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()>;

    /// Guarded on the salary marker still being `expected_marker`.
    async fn apply_salary_edit(
        &self,
        user_id: Uuid,
        level: SalaryLevel,
        grade: Grade,
        edited_at: DateTime<Utc>,
        expected_marker: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()>;

    /// Compare-and-swap on the contact counter.
    async fn swap_contact_counter(
        &self,
        user_id: Uuid,
        expected: ContactCounter,
        new: ContactCounter,
    ) -> RepositoryResult<()>;

    /// Unconditional write of the premium fields (promotion or demotion).
    async fn set_premium(&self, user_id: Uuid, premium: &PremiumState) -> RepositoryResult<()>;

    /// Users whose premium expiry is strictly before `now`, with that expiry.
    async fn list_lapsed_premium(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<(Uuid, DateTime<Utc>)>>;

    /// Clear the premium fields only if the expiry is still `expected_expiry`.
    /// Returns whether the row was cleared.
    async fn clear_premium_if_expiry(
        &self,
        user_id: Uuid,
        expected_expiry: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    async fn set_active(&self, user_id: Uuid, is_active: bool) -> RepositoryResult<()>;

    /// Sets banned and inactive together.
    async fn ban(&self, user_id: Uuid) -> RepositoryResult<()>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> RepositoryResult<()>;

    /// Guarded on the previous request timestamp.
    async fn record_reset_request(
        &self,
        user_id: Uuid,
        requested_at: DateTime<Utc>,
        expected_previous: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()>;

    /// Store a reset token, replacing any unconsumed one.
    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// In one atomic step: if the stored token is still `expected_token` and
    /// unexpired at `now`, set the password hash and clear the token.
    /// Returns `false` when the token was replaced, consumed or expired.
    async fn consume_reset_token(
        &self,
        user_id: Uuid,
        expected_token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    /// Location history at or after `since`, oldest first.
    async fn list_location_history_since(
        &self,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<LocationHistoryRecord>>;
}
