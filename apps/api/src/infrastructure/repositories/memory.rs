// In-memory repository implementations
// Used by tests and local runs without PostgreSQL. Each operation holds the
// store's locks for its whole read-modify-write, so the guarded methods are
// as atomic as their SQL counterparts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::domain::feedback::{Rating, Report};
use crate::domain::history::{LocationField, LocationHistoryRecord};
use crate::domain::repositories::{
    FeedbackRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::domain::user::{ContactCounter, Grade, Phone, PremiumState, SalaryLevel, UserProfile};

fn read<T>(lock: &RwLock<T>) -> RepositoryResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| RepositoryError::Database("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> RepositoryResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| RepositoryError::Database("store lock poisoned".to_string()))
}

fn user_not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("User {}", id))
}

/// In-memory user store
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, UserProfile>>,
    history: RwLock<Vec<LocationHistoryRecord>>,
    fail_history_writes: AtomicBool,
    injected_conflicts: AtomicU32,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every history append fail (for testing rollback behaviour).
    pub fn set_fail_history_writes(&self, fail: bool) {
        self.fail_history_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next `count` guarded writes report a lost race.
    pub fn inject_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    fn take_injected_conflict(&self) -> RepositoryResult<()> {
        let taken = self
            .injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if taken {
            Err(RepositoryError::Conflict)
        } else {
            Ok(())
        }
    }

    /// Overwrite a stored user as-is (for test setup).
    pub fn put(&self, user: UserProfile) -> RepositoryResult<()> {
        write(&self.users)?.insert(user.id, user);
        Ok(())
    }

    fn update<F>(&self, user_id: Uuid, f: F) -> RepositoryResult<()>
    where
        F: FnOnce(&mut UserProfile) -> RepositoryResult<()>,
    {
        let mut users = write(&self.users)?;
        let user = users.get_mut(&user_id).ok_or_else(|| user_not_found(user_id))?;
        f(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &UserProfile) -> RepositoryResult<()> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.phone == user.phone) {
            return Err(RepositoryError::Duplicate("phone number".to_string()));
        }
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Duplicate("user id".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<UserProfile>> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone: &Phone) -> RepositoryResult<Option<UserProfile>> {
        Ok(read(&self.users)?
            .values()
            .find(|u| &u.phone == phone)
            .cloned())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = read(&self.users)?.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        write(&self.users)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| user_not_found(id))
    }

    async fn apply_location_edit(
        &self,
        record: &LocationHistoryRecord,
        expected_marker: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        self.take_injected_conflict()?;
        let mut users = write(&self.users)?;
        let mut history = write(&self.history)?;

        let user = users
            .get_mut(&record.user_id)
            .ok_or_else(|| user_not_found(record.user_id))?;

        let marker = match record.field {
            LocationField::Current => user.edits.current_location,
            LocationField::Desired => user.edits.desired_location,
        };
        if marker != expected_marker {
            return Err(RepositoryError::Conflict);
        }

        // Fail before touching anything so nothing needs undoing.
        if self.fail_history_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(
                "location history insert failed".to_string(),
            ));
        }

        match record.field {
            LocationField::Current => {
                user.current_location = record.new.clone();
                user.edits.current_location = Some(record.edited_at);
            }
            LocationField::Desired => {
                user.desired_location = record.new.clone();
                user.edits.desired_location = Some(record.edited_at);
            }
        }
        user.profile_last_updated = record.edited_at;
        history.push(record.clone());
        Ok(())
    }

    async fn apply_salary_edit(
        &self,
        user_id: Uuid,
        level: SalaryLevel,
        grade: Grade,
        edited_at: DateTime<Utc>,
        expected_marker: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        self.take_injected_conflict()?;
        self.update(user_id, |user| {
            if user.edits.salary != expected_marker {
                return Err(RepositoryError::Conflict);
            }
            user.salary_level = level;
            user.grade = grade;
            user.edits.salary = Some(edited_at);
            user.profile_last_updated = edited_at;
            Ok(())
        })
    }

    async fn swap_contact_counter(
        &self,
        user_id: Uuid,
        expected: ContactCounter,
        new: ContactCounter,
    ) -> RepositoryResult<()> {
        self.take_injected_conflict()?;
        self.update(user_id, |user| {
            if user.contacts != expected {
                return Err(RepositoryError::Conflict);
            }
            user.contacts = new;
            Ok(())
        })
    }

    async fn set_premium(&self, user_id: Uuid, premium: &PremiumState) -> RepositoryResult<()> {
        self.update(user_id, |user| {
            user.premium = premium.clone();
            Ok(())
        })
    }

    async fn list_lapsed_premium(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<(Uuid, DateTime<Utc>)>> {
        Ok(read(&self.users)?
            .values()
            .filter_map(|u| {
                u.premium
                    .expires_at
                    .filter(|expires_at| *expires_at < now)
                    .map(|expires_at| (u.id, expires_at))
            })
            .collect())
    }

    async fn clear_premium_if_expiry(
        &self,
        user_id: Uuid,
        expected_expiry: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let mut users = write(&self.users)?;
        match users.get_mut(&user_id) {
            Some(user) if user.premium.expires_at == Some(expected_expiry) => {
                user.premium = PremiumState::default();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_active(&self, user_id: Uuid, is_active: bool) -> RepositoryResult<()> {
        self.update(user_id, |user| {
            user.is_active = is_active;
            Ok(())
        })
    }

    async fn ban(&self, user_id: Uuid) -> RepositoryResult<()> {
        self.update(user_id, |user| {
            user.ban();
            Ok(())
        })
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        self.update(user_id, |user| {
            user.password_hash = password_hash.to_string();
            Ok(())
        })
    }

    async fn record_reset_request(
        &self,
        user_id: Uuid,
        requested_at: DateTime<Utc>,
        expected_previous: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        self.take_injected_conflict()?;
        self.update(user_id, |user| {
            if user.password_reset.requested_at != expected_previous {
                return Err(RepositoryError::Conflict);
            }
            user.password_reset.requested_at = Some(requested_at);
            Ok(())
        })
    }

    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.update(user_id, |user| {
            user.password_reset.token = Some(token.to_string());
            user.password_reset.expires_at = Some(expires_at);
            Ok(())
        })
    }

    async fn consume_reset_token(
        &self,
        user_id: Uuid,
        expected_token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let mut users = write(&self.users)?;
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(false);
        };

        let reset = &mut user.password_reset;
        let still_valid = reset.token.as_deref() == Some(expected_token)
            && reset.expires_at.is_some_and(|expires_at| now <= expires_at);
        if !still_valid {
            return Ok(false);
        }

        reset.token = None;
        reset.expires_at = None;
        reset.consumed_at = Some(now);
        user.password_hash = password_hash.to_string();
        Ok(true)
    }

    async fn list_location_history_since(
        &self,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<LocationHistoryRecord>> {
        let mut records: Vec<LocationHistoryRecord> = read(&self.history)?
            .iter()
            .filter(|r| r.edited_at >= since)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.edited_at);
        Ok(records)
    }
}

/// In-memory ratings and reports
#[derive(Default)]
pub struct InMemoryFeedbackRepository {
    ratings: RwLock<Vec<Rating>>,
    reports: RwLock<Vec<Report>>,
    rating_reads: AtomicU32,
}

impl InMemoryFeedbackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rating lookups served so far.
    pub fn rating_reads(&self) -> u32 {
        self.rating_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn insert_rating(&self, rating: &Rating) -> RepositoryResult<()> {
        write(&self.ratings)?.push(rating.clone());
        Ok(())
    }

    async fn ratings_for(&self, user_id: Uuid) -> RepositoryResult<Vec<Rating>> {
        self.ratings_for_users(&[user_id]).await
    }

    async fn ratings_for_users(&self, user_ids: &[Uuid]) -> RepositoryResult<Vec<Rating>> {
        self.rating_reads.fetch_add(1, Ordering::SeqCst);
        Ok(read(&self.ratings)?
            .iter()
            .filter(|r| user_ids.contains(&r.rated_user_id))
            .cloned()
            .collect())
    }

    async fn insert_report(&self, report: &Report) -> RepositoryResult<()> {
        write(&self.reports)?.push(report.clone());
        Ok(())
    }

    async fn list_reports(&self) -> RepositoryResult<Vec<Report>> {
        let mut reports = read(&self.reports)?.clone();
        reports.sort_by_key(|r| r.created_at);
        Ok(reports)
    }
}
