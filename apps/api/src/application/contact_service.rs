//! WhatsApp contact initiation under the daily quota.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::retry_on_conflict;
use crate::domain::clock::Clock;
use crate::domain::policy::contact_throttle::{ContactPolicy, ContactUsage};
use crate::domain::repositories::UserRepository;
use crate::domain::user::UserProfile;
use crate::domain::{DomainError, DomainResult};

/// What the caller gets back after a contact is counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub target_id: Uuid,
    pub target_name: String,
    pub phone: String,
    pub whatsapp_url: String,
    pub usage: ContactUsage,
}

pub struct ContactService {
    users: Arc<dyn UserRepository>,
    policy: ContactPolicy,
    clock: Arc<dyn Clock>,
}

impl ContactService {
    pub fn new(users: Arc<dyn UserRepository>, policy: ContactPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { users, policy, clock }
    }

    /// Counts one contact from `user_id` to `target_id` and reveals the
    /// target's number.
    ///
    /// The counter is written with a compare-and-swap against the value the
    /// decision was computed from, so concurrent requests can never push the
    /// count past the quota.
    pub async fn contact(&self, user_id: Uuid, target_id: Uuid) -> DomainResult<ContactReceipt> {
        if user_id == target_id {
            return Err(DomainError::validation("You cannot contact yourself"));
        }

        let target = self
            .users
            .find_by_id(target_id)
            .await?
            .filter(UserProfile::is_listed)
            .ok_or_else(|| DomainError::not_found("User"))?;

        let usage = retry_on_conflict("contact", move || self.try_record(user_id)).await?;

        info!(
            user_id = %user_id,
            target_id = %target_id,
            used = usage.used,
            quota = usage.quota,
            "Contact recorded"
        );

        let digits: String = target
            .phone
            .as_str()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        Ok(ContactReceipt {
            target_id,
            target_name: target.full_name(),
            phone: target.phone.to_string(),
            whatsapp_url: format!("https://wa.me/{}", digits),
            usage,
        })
    }

    async fn try_record(&self, user_id: Uuid) -> DomainResult<ContactUsage> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;
        let now = self.clock.now();

        let next = match self.policy.record_contact(&user, now) {
            Ok(next) => next,
            Err(e) => {
                debug!(user_id = %user_id, "Contact refused: daily quota reached");
                return Err(e);
            }
        };

        self.users
            .swap_contact_counter(user_id, user.contacts, next)
            .await?;

        user.contacts = next;
        Ok(self.policy.usage(&user, now))
    }

    pub async fn usage(&self, user_id: Uuid) -> DomainResult<ContactUsage> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;
        Ok(self.policy.usage(&user, self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::Harness;
    use crate::domain::policy::premium::{promote, PremiumDuration};
    use crate::domain::user::profile::fixtures::at;
    use chrono::Duration;

    fn service(h: &Harness) -> ContactService {
        ContactService::new(h.users.clone(), ContactPolicy::default(), h.clock.clone())
    }

    #[tokio::test]
    async fn free_quota_is_two_per_day() {
        let h = Harness::at(at(2024, 5, 10, 8, 0, 0));
        let contacts = service(&h);
        let user = h.seed("+258841000001").await;
        let a = h.seed("+258841000002").await;
        let b = h.seed("+258841000003").await;
        let c = h.seed("+258841000004").await;

        let first = contacts.contact(user.id, a.id).await.unwrap();
        assert_eq!(first.usage.remaining, 1);
        assert_eq!(first.whatsapp_url, "https://wa.me/258841000002");
        contacts.contact(user.id, b.id).await.unwrap();

        let refused = contacts.contact(user.id, c.id).await;
        assert_eq!(refused.unwrap_err(), DomainError::QuotaExceeded { quota: 2 });
        assert_eq!(h.reload(&user).await.contacts.count, 2);
    }

    #[tokio::test]
    async fn counter_resets_on_the_next_local_day() {
        // 21:00 UTC is 23:00 in Maputo.
        let h = Harness::at(at(2024, 5, 10, 21, 0, 0));
        let contacts = service(&h);
        let user = h.seed("+258841000001").await;
        let target = h.seed("+258841000002").await;

        contacts.contact(user.id, target.id).await.unwrap();
        contacts.contact(user.id, target.id).await.unwrap();

        // 22:00:01 UTC is past local midnight.
        h.clock.advance(Duration::hours(1) + Duration::seconds(1));
        let receipt = contacts.contact(user.id, target.id).await.unwrap();
        assert_eq!(receipt.usage.used, 1);

        let stored = h.reload(&user).await;
        assert_eq!(stored.contacts.count, 1);
        assert_eq!(stored.contacts.last_reset, at(2024, 5, 10, 22, 0, 1));
    }

    #[tokio::test]
    async fn premium_gets_ten() {
        let now = at(2024, 5, 10, 8, 0, 0);
        let h = Harness::at(now);
        let contacts = service(&h);
        let user = h
            .seed_with("+258841000001", |u| {
                u.premium = promote(PremiumDuration::Week, Uuid::new_v4(), now)
            })
            .await;
        let target = h.seed("+258841000002").await;

        for _ in 0..10 {
            contacts.contact(user.id, target.id).await.unwrap();
        }
        assert_eq!(
            contacts.contact(user.id, target.id).await,
            Err(DomainError::QuotaExceeded { quota: 10 })
        );
    }

    #[tokio::test]
    async fn lapsed_premium_counts_as_free_before_the_sweep() {
        let now = at(2024, 5, 10, 8, 0, 0);
        let h = Harness::at(now);
        let contacts = service(&h);
        let user = h
            .seed_with("+258841000001", |u| {
                u.premium = promote(PremiumDuration::Week, Uuid::new_v4(), now - Duration::days(8))
            })
            .await;

        assert_eq!(contacts.usage(user.id).await.unwrap().quota, 2);
    }

    #[tokio::test]
    async fn banned_or_missing_targets_are_not_found() {
        let h = Harness::at(at(2024, 5, 10, 8, 0, 0));
        let contacts = service(&h);
        let user = h.seed("+258841000001").await;
        let banned = h.seed_with("+258841000002", |u| u.ban()).await;

        assert!(matches!(
            contacts.contact(user.id, banned.id).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            contacts.contact(user.id, Uuid::new_v4()).await,
            Err(DomainError::NotFound(_))
        ));
        assert_eq!(h.reload(&user).await.contacts.count, 0);
    }

    #[tokio::test]
    async fn lost_race_is_retried_against_fresh_counter() {
        let h = Harness::at(at(2024, 5, 10, 8, 0, 0));
        let contacts = service(&h);
        let user = h.seed("+258841000001").await;
        let target = h.seed("+258841000002").await;

        h.users.inject_conflicts(1);
        contacts.contact(user.id, target.id).await.unwrap();
        assert_eq!(h.reload(&user).await.contacts.count, 1);

        h.users.inject_conflicts(2);
        assert_eq!(
            contacts.contact(user.id, target.id).await,
            Err(DomainError::StorageConflict)
        );
        assert_eq!(h.reload(&user).await.contacts.count, 1);
    }

    #[tokio::test]
    async fn concurrent_contacts_never_exceed_quota() {
        let h = Harness::at(at(2024, 5, 10, 8, 0, 0));
        let contacts = Arc::new(service(&h));
        let user = h.seed("+258841000001").await;
        let target = h.seed("+258841000002").await;

        let attempts = (0..8).map(|_| {
            let contacts = contacts.clone();
            tokio::spawn(async move { contacts.contact(user.id, target.id).await })
        });
        let mut successes = 0;
        for handle in attempts.collect::<Vec<_>>() {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert!(successes <= 2);
        assert_eq!(h.reload(&user).await.contacts.count, successes);
    }
}
