//! Registration, login and session resolution.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{check_password_strength, hash_password, verify_password};
use crate::domain::clock::Clock;
use crate::domain::repositories::UserRepository;
use crate::domain::user::{Email, Grade, Location, NewUser, Phone, SalaryLevel, Sector, UserProfile};
use crate::domain::{DomainError, DomainResult};

const INVALID_CREDENTIALS: &str = "Invalid phone number or password";

/// Raw registration form.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub phone: String,
    pub email: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub sector: String,
    pub salary_level: i64,
    pub grade: String,
    pub current_province: String,
    pub current_district: Option<String>,
    pub desired_province: String,
    pub desired_district: Option<String>,
}

impl RegisterInput {
    fn validate(self, password_hash: String) -> DomainResult<NewUser> {
        let first_name = required("First name", &self.first_name)?;
        let last_name = required("Last name", &self.last_name)?;

        Ok(NewUser {
            phone: Phone::new(self.phone).map_err(DomainError::Validation)?,
            email: Email::parse_optional(self.email.as_deref()).map_err(DomainError::Validation)?,
            password_hash,
            first_name,
            last_name,
            sector: Sector::new(self.sector).map_err(DomainError::Validation)?,
            salary_level: SalaryLevel::new(self.salary_level).map_err(DomainError::Validation)?,
            grade: self.grade.parse::<Grade>().map_err(DomainError::Validation)?,
            current_location: Location::from_parts(&self.current_province, self.current_district.as_deref())
                .map_err(DomainError::Validation)?,
            desired_location: Location::from_parts(&self.desired_province, self.desired_district.as_deref())
                .map_err(DomainError::Validation)?,
        })
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Creates a free, active account.
    ///
    /// # Business Rules
    /// - Phone numbers are unique
    /// - Password must be at least 8 characters
    /// - Both locations need a district that belongs to the province
    pub async fn register(&self, input: RegisterInput) -> DomainResult<UserProfile> {
        check_password_strength(&input.password).map_err(DomainError::Validation)?;
        let password_hash = hash_password(&input.password)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))?;

        let new_user = input.validate(password_hash)?;
        let user = UserProfile::register(new_user, self.clock.now());
        self.users.create(&user).await?;

        info!(user_id = %user.id, sector = %user.sector, "User registered");
        Ok(user)
    }

    /// Checks credentials. Unknown, inactive and banned accounts all get
    /// the same answer as a wrong password.
    pub async fn login(&self, phone: &str, password: &str) -> DomainResult<UserProfile> {
        let invalid = || DomainError::Unauthorized(INVALID_CREDENTIALS.to_string());

        let phone = Phone::new(phone).map_err(|_| invalid())?;
        let user = self.users.find_by_phone(&phone).await?.ok_or_else(invalid)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(invalid());
        }
        if user.is_banned || !user.is_active {
            warn!(user_id = %user.id, banned = user.is_banned, "Login rejected: account disabled");
            return Err(invalid());
        }

        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Resolves the account behind a session token.
    pub async fn current_user(&self, user_id: Uuid) -> DomainResult<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("Account no longer exists".to_string()))?;

        if user.is_banned || !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".to_string()));
        }
        Ok(user)
    }

    pub async fn require_admin(&self, user_id: Uuid) -> DomainResult<UserProfile> {
        let user = self.current_user(user_id).await?;
        if !user.is_admin {
            warn!(user_id = %user.id, "Admin route refused for non-admin");
            return Err(DomainError::Forbidden("Admin access required".to_string()));
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::Harness;
    use crate::domain::user::profile::fixtures::at;

    fn input(phone: &str) -> RegisterInput {
        RegisterInput {
            phone: phone.to_string(),
            email: Some("ana@example.com".to_string()),
            password: "senha_segura".to_string(),
            first_name: " Ana ".to_string(),
            last_name: "Machava".to_string(),
            sector: "Educação".to_string(),
            salary_level: 10,
            grade: "B".to_string(),
            current_province: "Sofala".to_string(),
            current_district: Some("Beira".to_string()),
            desired_province: "Gaza".to_string(),
            desired_district: Some("Xai-Xai".to_string()),
        }
    }

    fn service(h: &Harness) -> AccountService {
        AccountService::new(h.users.clone(), h.clock.clone())
    }

    #[tokio::test]
    async fn register_and_login() {
        let h = Harness::at(at(2024, 1, 1, 8, 0, 0));
        let accounts = service(&h);

        let user = accounts.register(input("+258841234567")).await.unwrap();
        assert_eq!(user.first_name, "Ana");
        assert!(user.is_active);

        let logged_in = accounts.login("+258841234567", "senha_segura").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_phone_rejected() {
        let h = Harness::at(at(2024, 1, 1, 8, 0, 0));
        let accounts = service(&h);

        accounts.register(input("+258841234567")).await.unwrap();
        let result = accounts.register(input("+258841234567")).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn incomplete_location_rejected() {
        let h = Harness::at(at(2024, 1, 1, 8, 0, 0));
        let mut form = input("+258841234567");
        form.desired_district = None;

        let result = service(&h).register(form).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let h = Harness::at(at(2024, 1, 1, 8, 0, 0));
        let mut form = input("+258841234567");
        form.password = "curta".to_string();

        let result = service(&h).register(form).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn wrong_password_and_banned_accounts_fail_alike() {
        let h = Harness::at(at(2024, 1, 1, 8, 0, 0));
        let accounts = service(&h);
        let user = accounts.register(input("+258841234567")).await.unwrap();

        let wrong = accounts.login("+258841234567", "outra_senha").await;
        assert!(matches!(wrong, Err(DomainError::Unauthorized(_))));

        h.users.ban(user.id).await.unwrap();
        let banned = accounts.login("+258841234567", "senha_segura").await;
        assert_eq!(banned, wrong);
    }

    #[tokio::test]
    async fn admin_guard() {
        let h = Harness::at(at(2024, 1, 1, 8, 0, 0));
        let accounts = service(&h);
        let user = h.seed("+258841111111").await;
        let admin = h.seed_with("+258842222222", |u| u.is_admin = true).await;

        assert!(matches!(
            accounts.require_admin(user.id).await,
            Err(DomainError::Forbidden(_))
        ));
        assert_eq!(accounts.require_admin(admin.id).await.unwrap().id, admin.id);
    }
}
