//! Profile reads and governed profile edits.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::retry_on_conflict;
use crate::auth::password::{check_password_strength, hash_password, verify_password};
use crate::domain::clock::Clock;
use crate::domain::policy::contact_throttle::{ContactPolicy, ContactUsage};
use crate::domain::policy::edit_policy::{apply_edit, evaluate_edit, EditCategory, EditDecision, ProfileEdit};
use crate::domain::policy::premium::PlanState;
use crate::domain::repositories::UserRepository;
use crate::domain::user::UserProfile;
use crate::domain::{DomainError, DomainResult};

/// Edit eligibility for one field category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEligibility {
    pub category: EditCategory,
    #[serde(flatten)]
    pub decision: EditDecision,
}

/// Everything the profile page shows about the caller.
#[derive(Debug, Clone)]
pub struct ProfileOverview {
    pub user: UserProfile,
    pub plan: PlanState,
    pub eligibility: Vec<CategoryEligibility>,
    pub contacts: ContactUsage,
}

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    contacts: ContactPolicy,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, contacts: ContactPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { users, contacts, clock }
    }

    async fn load(&self, user_id: Uuid) -> DomainResult<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    pub async fn overview(&self, user_id: Uuid) -> DomainResult<ProfileOverview> {
        let user = self.load(user_id).await?;
        let now = self.clock.now();

        Ok(ProfileOverview {
            plan: user.plan_state(now),
            eligibility: eligibility(&user, now),
            contacts: self.contacts.usage(&user, now),
            user,
        })
    }

    /// Applies `edit` if the policy allows it at the current instant.
    ///
    /// The write is conditional on the category marker the decision was
    /// based on, so two concurrent edits of the same category cannot both
    /// land. Location edits append their history record in the same write.
    pub async fn edit(&self, user_id: Uuid, edit: ProfileEdit) -> DomainResult<UserProfile> {
        retry_on_conflict("profile_edit", move || self.try_edit(user_id, edit.clone())).await
    }

    async fn try_edit(&self, user_id: Uuid, edit: ProfileEdit) -> DomainResult<UserProfile> {
        let user = self.load(user_id).await?;
        let now = self.clock.now();
        let category = edit.category();

        let outcome = match apply_edit(&user, edit, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(user_id = %user_id, category = %category, reason = %e, "Edit denied");
                return Err(e);
            }
        };

        match &outcome.history {
            Some(record) => {
                self.users
                    .apply_location_edit(record, outcome.previous_marker)
                    .await?;
            }
            None => {
                self.users
                    .apply_salary_edit(
                        user_id,
                        outcome.updated.salary_level,
                        outcome.updated.grade,
                        now,
                        outcome.previous_marker,
                    )
                    .await?;
            }
        }

        info!(user_id = %user_id, category = %category, "Profile edit applied");
        Ok(outcome.updated)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        let user = self.load(user_id).await?;

        let valid = verify_password(current_password, &user.password_hash)
            .map_err(|e| DomainError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            warn!(user_id = %user_id, "Password change rejected: wrong current password");
            return Err(DomainError::validation("Current password is incorrect"));
        }

        check_password_strength(new_password).map_err(DomainError::Validation)?;
        let hash = hash_password(new_password)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))?;
        self.users.update_password(user_id, &hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Removes the account. Its location history is kept.
    pub async fn delete_account(&self, user_id: Uuid) -> DomainResult<()> {
        self.users.delete(user_id).await?;
        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}

/// Eligibility of every governed category at `now`, immutable ones included.
pub fn eligibility(user: &UserProfile, now: chrono::DateTime<chrono::Utc>) -> Vec<CategoryEligibility> {
    EditCategory::ALL
        .iter()
        .map(|&category| CategoryEligibility {
            category,
            decision: evaluate_edit(user, category, now),
        })
        .collect()
}
