//! Admin-mediated password reset: request, issue, redeem.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::retry_on_conflict;
use crate::auth::password::{check_password_strength, hash_password};
use crate::domain::clock::Clock;
use crate::domain::policy::password_reset::{self, IssuedToken, ResetStage};
use crate::domain::repositories::UserRepository;
use crate::domain::user::{Phone, UserProfile};
use crate::domain::{DomainError, DomainResult};

/// A reset request waiting for an admin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReset {
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub requested_at: DateTime<Utc>,
    pub stage: ResetStage,
}

pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl PasswordResetService {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>, token_ttl: Duration) -> Self {
        Self {
            users,
            clock,
            token_ttl,
        }
    }

    async fn find_by_phone(&self, phone: &str) -> DomainResult<UserProfile> {
        let phone = Phone::new(phone).map_err(DomainError::Validation)?;
        self.users
            .find_by_phone(&phone)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    /// Records a reset request; at most one per 24 hours.
    pub async fn request_reset(&self, phone: &str) -> DomainResult<()> {
        let phone = phone.to_string();
        retry_on_conflict("request_reset", move || self.try_request(phone.clone())).await
    }

    async fn try_request(&self, phone: String) -> DomainResult<()> {
        let user = self.find_by_phone(&phone).await?;
        let now = self.clock.now();

        if let Err(e) = password_reset::check_request_allowed(&user.password_reset, now) {
            warn!(user_id = %user.id, "Password reset requested again within 24 hours");
            return Err(e);
        }

        self.users
            .record_reset_request(user.id, now, user.password_reset.requested_at)
            .await?;

        info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Generates a fresh token for `user_id`, replacing any unconsumed one.
    pub async fn issue_token(&self, admin_id: Uuid, user_id: Uuid) -> DomainResult<IssuedToken> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;

        let issued = password_reset::issue_token(self.clock.now(), self.token_ttl);
        self.users
            .store_reset_token(user.id, &issued.token, issued.expires_at)
            .await?;

        info!(
            user_id = %user.id,
            admin_id = %admin_id,
            expires_at = %issued.expires_at,
            "Password reset token issued"
        );
        Ok(issued)
    }

    /// Checks the token and, in the same atomic write, stores the new
    /// password and clears the token.
    pub async fn reset_password(&self, phone: &str, token: &str, new_password: &str) -> DomainResult<()> {
        check_password_strength(new_password).map_err(DomainError::Validation)?;

        let user = self.find_by_phone(phone).await?;
        let now = self.clock.now();

        if let Err(e) = password_reset::verify_token(&user.password_reset, token, now) {
            warn!(user_id = %user.id, "Password reset with invalid or expired token");
            return Err(e);
        }

        let hash = hash_password(new_password)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))?;

        // Re-checks the token in storage: a concurrent re-issue or redemption wins.
        let consumed = self
            .users
            .consume_reset_token(user.id, token, &hash, now)
            .await?;
        if !consumed {
            warn!(user_id = %user.id, "Reset token replaced or used concurrently");
            return Err(DomainError::InvalidOrExpiredToken);
        }

        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Requests an admin still has to act on, oldest first. Requests whose
    /// token expired unused are listed again.
    pub async fn pending_requests(&self) -> DomainResult<Vec<PendingReset>> {
        let now = self.clock.now();
        let mut pending: Vec<PendingReset> = self
            .users
            .list_all()
            .await?
            .into_iter()
            .filter_map(|user| {
                let stage = password_reset::stage(&user.password_reset, now);
                let requested_at = user.password_reset.requested_at?;
                matches!(stage, ResetStage::Requested | ResetStage::Expired).then(|| PendingReset {
                    user_id: user.id,
                    name: user.full_name(),
                    phone: user.phone.to_string(),
                    requested_at,
                    stage,
                })
            })
            .collect();

        pending.sort_by_key(|p| p.requested_at);
        Ok(pending)
    }
}
