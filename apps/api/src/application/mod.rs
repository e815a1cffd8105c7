//! Application Layer
//!
//! Use-case services. Each governed operation loads a snapshot, asks the
//! domain policy for a decision, and commits it with a conditional write.
//! A lost race is retried once against a fresh snapshot.

use std::future::Future;

use crate::domain::{DomainError, DomainResult};

pub mod account_service;
pub mod admin_service;
pub mod contact_service;
pub mod feedback_service;
pub mod password_reset_service;
pub mod premium_service;
pub mod profile_service;
pub mod search_service;

pub use account_service::{AccountService, RegisterInput};
pub use admin_service::{AdminService, AdminStats};
pub use contact_service::{ContactReceipt, ContactService};
pub use feedback_service::FeedbackService;
pub use password_reset_service::{PasswordResetService, PendingReset};
pub use premium_service::{PremiumService, SweepReport};
pub use profile_service::{CategoryEligibility, ProfileOverview, ProfileService};
pub use search_service::{MatchView, SearchFilters, SearchResults, SearchService};

/// Runs `attempt`, and runs it once more if it lost a concurrent race.
/// A second `StorageConflict` is returned to the caller.
pub(crate) async fn retry_on_conflict<T, F, Fut>(operation: &'static str, mut attempt: F) -> DomainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    match attempt().await {
        Err(DomainError::StorageConflict) => {
            tracing::warn!(operation, "Concurrent update detected, retrying once");
            attempt().await
        }
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};

    use crate::domain::clock::FixedClock;
    use crate::domain::repositories::UserRepository;
    use crate::domain::user::profile::fixtures::new_user;
    use crate::domain::user::UserProfile;
    use crate::infrastructure::repositories::{InMemoryFeedbackRepository, InMemoryUserRepository};

    pub struct Harness {
        pub users: Arc<InMemoryUserRepository>,
        pub feedback: Arc<InMemoryFeedbackRepository>,
        pub clock: Arc<FixedClock>,
    }

    impl Harness {
        pub fn at(now: DateTime<Utc>) -> Self {
            Self {
                users: Arc::new(InMemoryUserRepository::new()),
                feedback: Arc::new(InMemoryFeedbackRepository::new()),
                clock: Arc::new(FixedClock::new(now)),
            }
        }

        /// Registers a user with the fixture profile at the current clock time.
        pub async fn seed(&self, phone: &str) -> UserProfile {
            self.seed_with(phone, |_| {}).await
        }

        pub async fn seed_with<F>(&self, phone: &str, customize: F) -> UserProfile
        where
            F: FnOnce(&mut UserProfile),
        {
            use crate::domain::clock::Clock;
            let mut user = UserProfile::register(new_user(phone), self.clock.now());
            customize(&mut user);
            self.users.create(&user).await.unwrap();
            user
        }

        pub async fn reload(&self, user: &UserProfile) -> UserProfile {
            self.users.find_by_id(user.id).await.unwrap().unwrap()
        }
    }
}
