use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::feedback::{Rating, Report};

/// Append-only storage for ratings and reports
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn insert_rating(&self, rating: &Rating) -> RepositoryResult<()>;

    /// Ratings received by `user_id`.
    async fn ratings_for(&self, user_id: Uuid) -> RepositoryResult<Vec<Rating>>;

    /// Ratings received by any of `user_ids`, in one read.
    async fn ratings_for_users(&self, user_ids: &[Uuid]) -> RepositoryResult<Vec<Rating>>;

    async fn insert_report(&self, report: &Report) -> RepositoryResult<()>;

    /// All reports, oldest first.
    async fn list_reports(&self) -> RepositoryResult<Vec<Report>>;
}
