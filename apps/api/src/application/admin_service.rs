//! Admin moderation and reporting.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::history::LocationHistoryRecord;
use crate::domain::repositories::UserRepository;
use crate::domain::user::UserProfile;
use crate::domain::{DomainError, DomainResult};

/// Headline numbers for the admin dashboard. Admin accounts are not counted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total: usize,
    pub active: usize,
    pub premium: usize,
    pub banned: usize,
    /// Users per current province.
    pub by_province: BTreeMap<String, usize>,
}

pub struct AdminService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    async fn load(&self, user_id: Uuid) -> DomainResult<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    pub async fn user(&self, user_id: Uuid) -> DomainResult<UserProfile> {
        self.load(user_id).await
    }

    pub async fn list_users(&self) -> DomainResult<Vec<UserProfile>> {
        Ok(self.users.list_all().await?)
    }

    pub async fn stats(&self) -> DomainResult<AdminStats> {
        let now = self.clock.now();
        let users = self.users.list_all().await?;

        let mut stats = AdminStats::default();
        for user in users.iter().filter(|u| !u.is_admin) {
            stats.total += 1;
            if user.is_active {
                stats.active += 1;
            }
            if user.has_active_premium(now) {
                stats.premium += 1;
            }
            if user.is_banned {
                stats.banned += 1;
            }
            *stats
                .by_province
                .entry(user.current_location.province().to_string())
                .or_default() += 1;
        }
        Ok(stats)
    }

    /// Activates or deactivates an account. Banned accounts stay inactive.
    pub async fn set_active(&self, admin_id: Uuid, user_id: Uuid, is_active: bool) -> DomainResult<()> {
        let user = self.load(user_id).await?;
        if is_active && user.is_banned {
            return Err(DomainError::validation("A banned user cannot be reactivated"));
        }
        if user.id == admin_id {
            return Err(DomainError::validation("You cannot change your own status"));
        }

        self.users.set_active(user_id, is_active).await?;
        info!(user_id = %user_id, admin_id = %admin_id, is_active, "User status changed");
        Ok(())
    }

    pub async fn ban(&self, admin_id: Uuid, user_id: Uuid) -> DomainResult<()> {
        let user = self.load(user_id).await?;
        if user.id == admin_id {
            return Err(DomainError::validation("You cannot ban yourself"));
        }

        self.users.ban(user_id).await?;
        info!(user_id = %user_id, admin_id = %admin_id, "User banned");
        Ok(())
    }

    pub async fn location_history_since(
        &self,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<LocationHistoryRecord>> {
        Ok(self.users.list_location_history_since(since).await?)
    }
}
