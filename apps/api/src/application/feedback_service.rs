//! Ratings and abuse reports between users.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::feedback::{Rating, RatingSummary, Report};
use crate::domain::repositories::{FeedbackRepository, UserRepository};
use crate::domain::{DomainError, DomainResult};

pub struct FeedbackService {
    users: Arc<dyn UserRepository>,
    feedback: Arc<dyn FeedbackRepository>,
    clock: Arc<dyn Clock>,
}

impl FeedbackService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        feedback: Arc<dyn FeedbackRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            feedback,
            clock,
        }
    }

    async fn ensure_exists(&self, user_id: Uuid) -> DomainResult<()> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("User"))
    }

    pub async fn rate(
        &self,
        rater_id: Uuid,
        rated_user_id: Uuid,
        stars: i64,
        comment: Option<String>,
    ) -> DomainResult<Rating> {
        let rating = Rating::new(rater_id, rated_user_id, stars, comment, self.clock.now())
            .map_err(DomainError::Validation)?;
        self.ensure_exists(rated_user_id).await?;

        self.feedback.insert_rating(&rating).await?;
        info!(rater_id = %rater_id, rated_user_id = %rated_user_id, stars = rating.stars, "Rating recorded");
        Ok(rating)
    }

    pub async fn report(
        &self,
        reporter_id: Uuid,
        reported_user_id: Uuid,
        reason: String,
        description: Option<String>,
    ) -> DomainResult<Report> {
        let report = Report::new(reporter_id, reported_user_id, reason, description, self.clock.now())
            .map_err(DomainError::Validation)?;
        self.ensure_exists(reported_user_id).await?;

        self.feedback.insert_report(&report).await?;
        info!(reporter_id = %reporter_id, reported_user_id = %reported_user_id, "Report filed");
        Ok(report)
    }

    pub async fn summary_for(&self, user_id: Uuid) -> DomainResult<RatingSummary> {
        let ratings = self.feedback.ratings_for(user_id).await?;
        Ok(RatingSummary::from_ratings(&ratings))
    }

    pub async fn reports(&self) -> DomainResult<Vec<Report>> {
        Ok(self.feedback.list_reports().await?)
    }
}
