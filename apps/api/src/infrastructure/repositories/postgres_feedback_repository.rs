use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::postgres_user_repository::db_error;
use crate::domain::feedback::{Rating, Report, ReportStatus};
use crate::domain::repositories::{FeedbackRepository, RepositoryError, RepositoryResult};

/// PostgreSQL implementation of FeedbackRepository
pub struct PostgresFeedbackRepository {
    pool: PgPool,
}

impl PostgresFeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    rater_id: Uuid,
    rated_user_id: Uuid,
    stars: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            rater_id: row.rater_id,
            rated_user_id: row.rated_user_id,
            stars: row.stars.clamp(1, 5) as u8,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    reporter_id: Uuid,
    reported_user_id: Uuid,
    reason: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl ReportRow {
    fn into_report(self) -> RepositoryResult<Report> {
        let status = ReportStatus::parse(&self.status).ok_or_else(|| {
            RepositoryError::Database(format!("Invalid report status: {}", self.status))
        })?;

        Ok(Report {
            id: self.id,
            reporter_id: self.reporter_id,
            reported_user_id: self.reported_user_id,
            reason: self.reason,
            description: self.description,
            status,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl FeedbackRepository for PostgresFeedbackRepository {
    async fn insert_rating(&self, rating: &Rating) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ratings (id, rater_id, rated_user_id, stars, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rating.id)
        .bind(rating.rater_id)
        .bind(rating.rated_user_id)
        .bind(rating.stars as i16)
        .bind(&rating.comment)
        .bind(rating.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert rating", e))?;

        Ok(())
    }

    async fn ratings_for(&self, user_id: Uuid) -> RepositoryResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, RatingRow>(
            r#"
            SELECT id, rater_id, rated_user_id, stars, comment, created_at
            FROM ratings
            WHERE rated_user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load ratings", e))?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn ratings_for_users(&self, user_ids: &[Uuid]) -> RepositoryResult<Vec<Rating>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RatingRow>(
            r#"
            SELECT id, rater_id, rated_user_id, stars, comment, created_at
            FROM ratings
            WHERE rated_user_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load ratings", e))?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn insert_report(&self, report: &Report) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reports (
                id, reporter_id, reported_user_id, reason, description, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(report.reported_user_id)
        .bind(&report.reason)
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert report", e))?;

        Ok(())
    }

    async fn list_reports(&self) -> RepositoryResult<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, reporter_id, reported_user_id, reason, description, status, created_at
            FROM reports
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list reports", e))?;

        rows.into_iter().map(ReportRow::into_report).collect()
    }
}
