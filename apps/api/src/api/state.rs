use std::sync::Arc;

use crate::application::{
    AccountService, AdminService, ContactService, FeedbackService, PasswordResetService,
    PremiumService, ProfileService, SearchService,
};
use crate::config::AppConfig;
use crate::domain::clock::Clock;
use crate::domain::policy::contact_throttle::ContactPolicy;
use crate::domain::repositories::{FeedbackRepository, UserRepository};

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub profiles: Arc<ProfileService>,
    pub contacts: Arc<ContactService>,
    pub search: Arc<SearchService>,
    pub feedback: Arc<FeedbackService>,
    pub premium: Arc<PremiumService>,
    pub resets: Arc<PasswordResetService>,
    pub admin: Arc<AdminService>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        feedback: Arc<dyn FeedbackRepository>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        let policy = ContactPolicy::new(config.contact_quotas, config.contact_day_offset);

        Self {
            accounts: Arc::new(AccountService::new(users.clone(), clock.clone())),
            profiles: Arc::new(ProfileService::new(users.clone(), policy, clock.clone())),
            contacts: Arc::new(ContactService::new(users.clone(), policy, clock.clone())),
            search: Arc::new(SearchService::new(users.clone(), feedback.clone(), clock.clone())),
            feedback: Arc::new(FeedbackService::new(users.clone(), feedback, clock.clone())),
            premium: Arc::new(PremiumService::new(users.clone(), clock.clone())),
            resets: Arc::new(PasswordResetService::new(
                users.clone(),
                clock.clone(),
                config.reset_token_ttl,
            )),
            admin: Arc::new(AdminService::new(users, clock.clone())),
            clock,
            config: Arc::new(config),
        }
    }
}
