use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::history::{LocationField, LocationHistoryRecord};
use crate::domain::repositories::{RepositoryError, RepositoryResult, UserRepository};
use crate::domain::user::{
    ContactCounter, EditMarkers, Email, Grade, Location, PasswordResetState, Phone, PremiumState,
    SalaryLevel, Sector, UserProfile,
};

const USER_COLUMNS: &str = r#"
    id, phone, email, password_hash, first_name, last_name, sector,
    salary_level, grade,
    current_province, current_district, desired_province, desired_district,
    is_premium, premium_expires_at, premium_promoted_by,
    contacts_today, last_contact_reset,
    is_active, is_banned, is_admin, permutation_completed,
    last_salary_edit, last_current_location_edit, last_desired_location_edit,
    reset_requested_at, reset_token, reset_token_expires_at, reset_consumed_at,
    profile_last_updated, created_at
"#;

/// Maps a sqlx error, turning unique violations into `Duplicate`.
pub(crate) fn db_error(context: &str, err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            return RepositoryError::Duplicate(context.to_string());
        }
    }
    RepositoryError::Database(format!("{}: {}", context, err))
}

fn corrupt(column: &str, message: String) -> RepositoryError {
    RepositoryError::Database(format!("Invalid {} from database: {}", column, message))
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explains why a guarded update matched no row.
    async fn missed_update(&self, user_id: Uuid) -> RepositoryError {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await;

        match exists {
            Ok(true) => RepositoryError::Conflict,
            Ok(false) => RepositoryError::NotFound(format!("User {}", user_id)),
            Err(e) => db_error("Failed to check user", e),
        }
    }

    fn expect_one_row(rows: u64, user_id: Uuid) -> RepositoryResult<()> {
        if rows == 0 {
            Err(RepositoryError::NotFound(format!("User {}", user_id)))
        } else {
            Ok(())
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    phone: String,
    email: Option<String>,
    password_hash: String,
    first_name: String,
    last_name: String,
    sector: String,
    salary_level: i16,
    grade: String,
    current_province: String,
    current_district: String,
    desired_province: String,
    desired_district: String,
    is_premium: bool,
    premium_expires_at: Option<DateTime<Utc>>,
    premium_promoted_by: Option<Uuid>,
    contacts_today: i32,
    last_contact_reset: DateTime<Utc>,
    is_active: bool,
    is_banned: bool,
    is_admin: bool,
    permutation_completed: bool,
    last_salary_edit: Option<DateTime<Utc>>,
    last_current_location_edit: Option<DateTime<Utc>>,
    last_desired_location_edit: Option<DateTime<Utc>>,
    reset_requested_at: Option<DateTime<Utc>>,
    reset_token: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    reset_consumed_at: Option<DateTime<Utc>>,
    profile_last_updated: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_profile(self) -> RepositoryResult<UserProfile> {
        let phone = Phone::new(self.phone).map_err(|e| corrupt("phone", e))?;
        let email = Email::parse_optional(self.email.as_deref()).map_err(|e| corrupt("email", e))?;
        let salary_level =
            SalaryLevel::new(self.salary_level as i64).map_err(|e| corrupt("salary_level", e))?;
        let grade = self.grade.parse::<Grade>().map_err(|e| corrupt("grade", e))?;

        Ok(UserProfile {
            id: self.id,
            phone,
            email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            sector: Sector::from_persistence(self.sector),
            salary_level,
            grade,
            current_location: Location::from_persistence(
                self.current_province,
                self.current_district,
            ),
            desired_location: Location::from_persistence(
                self.desired_province,
                self.desired_district,
            ),
            premium: PremiumState {
                is_premium: self.is_premium,
                expires_at: self.premium_expires_at,
                promoted_by: self.premium_promoted_by,
            },
            contacts: ContactCounter {
                count: self.contacts_today.max(0) as u32,
                last_reset: self.last_contact_reset,
            },
            is_active: self.is_active,
            is_banned: self.is_banned,
            is_admin: self.is_admin,
            permutation_completed: self.permutation_completed,
            edits: EditMarkers {
                salary: self.last_salary_edit,
                current_location: self.last_current_location_edit,
                desired_location: self.last_desired_location_edit,
            },
            password_reset: PasswordResetState {
                requested_at: self.reset_requested_at,
                token: self.reset_token,
                expires_at: self.reset_token_expires_at,
                consumed_at: self.reset_consumed_at,
            },
            profile_last_updated: self.profile_last_updated,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    user_id: Uuid,
    field: String,
    old_province: String,
    old_district: String,
    new_province: String,
    new_district: String,
    edited_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_record(self) -> RepositoryResult<LocationHistoryRecord> {
        let field = self
            .field
            .parse::<LocationField>()
            .map_err(|e| corrupt("field", e))?;

        Ok(LocationHistoryRecord {
            id: self.id,
            user_id: self.user_id,
            field,
            old: Location::from_persistence(self.old_province, self.old_district),
            new: Location::from_persistence(self.new_province, self.new_district),
            edited_at: self.edited_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &UserProfile) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, phone, email, password_hash, first_name, last_name, sector,
                salary_level, grade,
                current_province, current_district, desired_province, desired_district,
                is_premium, premium_expires_at, premium_promoted_by,
                contacts_today, last_contact_reset,
                is_active, is_banned, is_admin, permutation_completed,
                profile_last_updated, created_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            "#,
        )
        .bind(user.id)
        .bind(user.phone.as_str())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.sector.as_str())
        .bind(user.salary_level.value() as i16)
        .bind(user.grade.as_str())
        .bind(user.current_location.province())
        .bind(user.current_location.district())
        .bind(user.desired_location.province())
        .bind(user.desired_location.district())
        .bind(user.premium.is_premium)
        .bind(user.premium.expires_at)
        .bind(user.premium.promoted_by)
        .bind(user.contacts.count as i32)
        .bind(user.contacts.last_reset)
        .bind(user.is_active)
        .bind(user.is_banned)
        .bind(user.is_admin)
        .bind(user.permutation_completed)
        .bind(user.profile_last_updated)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("phone number", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<UserProfile>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user by id", e))?;

        row.map(UserRow::into_profile).transpose()
    }

    async fn find_by_phone(&self, phone: &Phone) -> RepositoryResult<Option<UserProfile>> {
        let sql = format!("SELECT {} FROM users WHERE phone = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(phone.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find user by phone", e))?;

        row.map(UserRow::into_profile).transpose()
    }

    async fn list_all(&self) -> RepositoryResult<Vec<UserProfile>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list users", e))?;

        rows.into_iter().map(UserRow::into_profile).collect()
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let rows = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete user", e))?
            .rows_affected();

        Self::expect_one_row(rows, id)
    }

    async fn apply_location_edit(
        &self,
        record: &LocationHistoryRecord,
        expected_marker: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        let update = match record.field {
            LocationField::Current => {
                r#"
                UPDATE users
                SET current_province = $2,
                    current_district = $3,
                    last_current_location_edit = $4,
                    profile_last_updated = $4
                WHERE id = $1 AND last_current_location_edit IS NOT DISTINCT FROM $5
                "#
            }
            LocationField::Desired => {
                r#"
                UPDATE users
                SET desired_province = $2,
                    desired_district = $3,
                    last_desired_location_edit = $4,
                    profile_last_updated = $4
                WHERE id = $1 AND last_desired_location_edit IS NOT DISTINCT FROM $5
                "#
            }
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;

        let rows = sqlx::query(update)
            .bind(record.user_id)
            .bind(record.new.province())
            .bind(record.new.district())
            .bind(record.edited_at)
            .bind(expected_marker)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to update location", e))?
            .rows_affected();

        if rows == 0 {
            tx.rollback()
                .await
                .map_err(|e| db_error("Failed to roll back", e))?;
            return Err(self.missed_update(record.user_id).await);
        }

        // Dropping `tx` on error rolls the location update back.
        sqlx::query(
            r#"
            INSERT INTO location_history (
                id, user_id, field,
                old_province, old_district, new_province, new_district,
                edited_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.field.as_str())
        .bind(record.old.province())
        .bind(record.old.district())
        .bind(record.new.province())
        .bind(record.new.district())
        .bind(record.edited_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to record location history", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit location edit", e))
    }

    async fn apply_salary_edit(
        &self,
        user_id: Uuid,
        level: SalaryLevel,
        grade: Grade,
        edited_at: DateTime<Utc>,
        expected_marker: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET salary_level = $2,
                grade = $3,
                last_salary_edit = $4,
                profile_last_updated = $4
            WHERE id = $1 AND last_salary_edit IS NOT DISTINCT FROM $5
            "#,
        )
        .bind(user_id)
        .bind(level.value() as i16)
        .bind(grade.as_str())
        .bind(edited_at)
        .bind(expected_marker)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update salary", e))?
        .rows_affected();

        if rows == 0 {
            return Err(self.missed_update(user_id).await);
        }
        Ok(())
    }

    async fn swap_contact_counter(
        &self,
        user_id: Uuid,
        expected: ContactCounter,
        new: ContactCounter,
    ) -> RepositoryResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET contacts_today = $2, last_contact_reset = $3
            WHERE id = $1 AND contacts_today = $4 AND last_contact_reset = $5
            "#,
        )
        .bind(user_id)
        .bind(new.count as i32)
        .bind(new.last_reset)
        .bind(expected.count as i32)
        .bind(expected.last_reset)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update contact counter", e))?
        .rows_affected();

        if rows == 0 {
            return Err(self.missed_update(user_id).await);
        }
        Ok(())
    }

    async fn set_premium(&self, user_id: Uuid, premium: &PremiumState) -> RepositoryResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET is_premium = $2, premium_expires_at = $3, premium_promoted_by = $4
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(premium.is_premium)
        .bind(premium.expires_at)
        .bind(premium.promoted_by)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update premium", e))?
        .rows_affected();

        Self::expect_one_row(rows, user_id)
    }

    async fn list_lapsed_premium(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<(Uuid, DateTime<Utc>)>> {
        sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            SELECT id, premium_expires_at
            FROM users
            WHERE premium_expires_at IS NOT NULL AND premium_expires_at < $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list lapsed premium users", e))
    }

    async fn clear_premium_if_expiry(
        &self,
        user_id: Uuid,
        expected_expiry: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET is_premium = FALSE, premium_expires_at = NULL, premium_promoted_by = NULL
            WHERE id = $1 AND premium_expires_at = $2
            "#,
        )
        .bind(user_id)
        .bind(expected_expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to clear premium", e))?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn set_active(&self, user_id: Uuid, is_active: bool) -> RepositoryResult<()> {
        let rows = sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(user_id)
            .bind(is_active)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update status", e))?
            .rows_affected();

        Self::expect_one_row(rows, user_id)
    }

    async fn ban(&self, user_id: Uuid) -> RepositoryResult<()> {
        let rows = sqlx::query("UPDATE users SET is_banned = TRUE, is_active = FALSE WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to ban user", e))?
            .rows_affected();

        Self::expect_one_row(rows, user_id)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        let rows = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update password", e))?
            .rows_affected();

        Self::expect_one_row(rows, user_id)
    }

    async fn record_reset_request(
        &self,
        user_id: Uuid,
        requested_at: DateTime<Utc>,
        expected_previous: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET reset_requested_at = $2
            WHERE id = $1 AND reset_requested_at IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(user_id)
        .bind(requested_at)
        .bind(expected_previous)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record reset request", e))?
        .rows_affected();

        if rows == 0 {
            return Err(self.missed_update(user_id).await);
        }
        Ok(())
    }

    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to store reset token", e))?
        .rows_affected();

        Self::expect_one_row(rows, user_id)
    }

    async fn consume_reset_token(
        &self,
        user_id: Uuid,
        expected_token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3,
                reset_token = NULL,
                reset_token_expires_at = NULL,
                reset_consumed_at = $4
            WHERE id = $1
              AND reset_token = $2
              AND reset_token_expires_at >= $4
            "#,
        )
        .bind(user_id)
        .bind(expected_token)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to consume reset token", e))?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn list_location_history_since(
        &self,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<LocationHistoryRecord>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, user_id, field,
                   old_province, old_district, new_province, new_district,
                   edited_at
            FROM location_history
            WHERE edited_at >= $1
            ORDER BY edited_at
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list location history", e))?;

        rows.into_iter().map(HistoryRow::into_record).collect()
    }
}
