//! Swap-partner search with compatibility buckets.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::feedback::{Rating, RatingSummary};
use crate::domain::policy::compatibility::{classify, compute_compatibility, MatchBucket};
use crate::domain::repositories::{FeedbackRepository, UserRepository};
use crate::domain::user::{Grade, Location, SalaryLevel, Sector, UserProfile};
use crate::domain::{DomainError, DomainResult};

/// Optional equality filters; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub sector: Option<String>,
    pub current_province: Option<String>,
    pub desired_province: Option<String>,
}

impl SearchFilters {
    fn matches(&self, candidate: &UserProfile) -> bool {
        fn eq(filter: &Option<String>, value: &str) -> bool {
            filter
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map_or(true, |f| f == value)
        }

        eq(&self.sector, candidate.sector.as_str())
            && eq(&self.current_province, candidate.current_location.province())
            && eq(&self.desired_province, candidate.desired_location.province())
    }
}

/// A candidate as the viewer sees it. The phone number is only revealed
/// through a counted contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: Uuid,
    pub name: String,
    pub sector: Sector,
    pub salary_level: SalaryLevel,
    pub grade: Grade,
    pub current_location: Location,
    pub desired_location: Location,
    pub is_premium: bool,
    pub score: u8,
    pub bucket: MatchBucket,
    pub rating: RatingSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Score of 80 or more.
    pub priority: Vec<MatchView>,
    pub same_sector_and_level: Vec<MatchView>,
    pub others: Vec<MatchView>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.priority.len() + self.same_sector_and_level.len() + self.others.len()
    }
}

pub struct SearchService {
    users: Arc<dyn UserRepository>,
    feedback: Arc<dyn FeedbackRepository>,
    clock: Arc<dyn Clock>,
}

impl SearchService {
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

    /// Listed users other than the viewer that pass `filters`, scored from
    /// the viewer's side and grouped by bucket, best score first.
    pub async fn search(&self, viewer_id: Uuid, filters: &SearchFilters) -> DomainResult<SearchResults> {
        let users = self.users.list_all().await?;
        let viewer = users
            .iter()
            .find(|u| u.id == viewer_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("User"))?;
        let now = self.clock.now();

        let candidates: Vec<UserProfile> = users
            .into_iter()
            .filter(|u| u.id != viewer.id && u.is_listed() && filters.matches(u))
            .collect();
        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let mut ratings: HashMap<Uuid, Vec<Rating>> = HashMap::new();
        for rating in self.feedback.ratings_for_users(&ids).await? {
            ratings.entry(rating.rated_user_id).or_default().push(rating);
        }

        let mut results = SearchResults::default();
        for candidate in candidates {
            let score = compute_compatibility(&viewer, &candidate);
            let bucket = classify(&viewer, &candidate, score);
            let rating = RatingSummary::from_ratings(
                ratings.get(&candidate.id).map(Vec::as_slice).unwrap_or_default(),
            );

            let view = MatchView {
                id: candidate.id,
                name: candidate.full_name(),
                is_premium: candidate.has_active_premium(now),
                sector: candidate.sector,
                salary_level: candidate.salary_level,
                grade: candidate.grade,
                current_location: candidate.current_location,
                desired_location: candidate.desired_location,
                score,
                bucket,
                rating,
            };

            match bucket {
                MatchBucket::Priority => results.priority.push(view),
                MatchBucket::SameSectorAndLevel => results.same_sector_and_level.push(view),
                MatchBucket::Excluded => results.others.push(view),
            }
        }

        for bucket in [
            &mut results.priority,
            &mut results.same_sector_and_level,
            &mut results.others,
        ] {
            bucket.sort_by_key(|m| (Reverse(m.score), Reverse(m.is_premium), m.name.clone()));
        }

        debug!(
            viewer_id = %viewer_id,
            priority = results.priority.len(),
            same_sector_and_level = results.same_sector_and_level.len(),
            others = results.others.len(),
            "Search completed"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::Harness;
    use crate::domain::user::profile::fixtures::at;

    fn service(h: &Harness) -> SearchService {
        SearchService::new(h.users.clone(), h.feedback.clone(), h.clock.clone())
    }

    fn set_locations(u: &mut UserProfile, current: (&str, &str), desired: (&str, &str)) {
        u.current_location = Location::new(current.0, current.1).unwrap();
        u.desired_location = Location::new(desired.0, desired.1).unwrap();
    }

    #[tokio::test]
    async fn results_are_bucketed_and_scored() {
        let h = Harness::at(at(2024, 4, 1, 9, 0, 0));
        // Fixture viewer: Sofala/Beira wanting Gaza/Xai-Xai.
        let viewer = h.seed("+258841000001").await;
        let perfect = h
            .seed_with("+258841000002", |u| {
                set_locations(u, ("Gaza", "Xai-Xai"), ("Sofala", "Beira"))
            })
            .await;
        let colleague = h
            .seed_with("+258841000003", |u| {
                set_locations(u, ("Tete", "Moatize"), ("Niassa", "Lichinga"))
            })
            .await;
        let stranger = h
            .seed_with("+258841000004", |u| {
                u.sector = Sector::new("Saúde").unwrap();
                u.salary_level = SalaryLevel::new(3).unwrap();
            })
            .await;

        let results = service(&h)
            .search(viewer.id, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(results.total(), 3);
        assert_eq!(results.priority[0].id, perfect.id);
        assert_eq!(results.priority[0].score, 100);
        assert_eq!(results.same_sector_and_level[0].id, colleague.id);
        assert_eq!(results.others[0].id, stranger.id);
    }

    #[tokio::test]
    async fn hidden_users_are_excluded() {
        let h = Harness::at(at(2024, 4, 1, 9, 0, 0));
        let viewer = h.seed("+258841000001").await;
        h.seed_with("+258841000002", |u| u.ban()).await;
        h.seed_with("+258841000003", |u| u.is_active = false).await;
        h.seed_with("+258841000004", |u| u.is_admin = true).await;
        let visible = h.seed("+258841000005").await;

        let results = service(&h)
            .search(viewer.id, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(results.total(), 1);
        assert_eq!(results.same_sector_and_level[0].id, visible.id);
    }

    #[tokio::test]
    async fn filters_apply_to_candidates() {
        let h = Harness::at(at(2024, 4, 1, 9, 0, 0));
        let viewer = h.seed("+258841000001").await;
        h.seed_with("+258841000002", |u| {
            set_locations(u, ("Gaza", "Xai-Xai"), ("Sofala", "Beira"))
        })
        .await;
        h.seed_with("+258841000003", |u| {
            set_locations(u, ("Tete", "Moatize"), ("Sofala", "Dondo"))
        })
        .await;

        let filters = SearchFilters {
            current_province: Some("Tete".to_string()),
            desired_province: Some("Sofala".to_string()),
            ..Default::default()
        };
        let results = service(&h).search(viewer.id, &filters).await.unwrap();
        assert_eq!(results.total(), 1);
        assert_eq!(results.same_sector_and_level[0].current_location.province(), "Tete");

        let filters = SearchFilters {
            sector: Some("Saúde".to_string()),
            ..Default::default()
        };
        assert_eq!(service(&h).search(viewer.id, &filters).await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn rating_summary_attached() {
        let now = at(2024, 4, 1, 9, 0, 0);
        let h = Harness::at(now);
        let viewer = h.seed("+258841000001").await;
        let rated = h.seed("+258841000002").await;

        for stars in [5, 3] {
            let rating = Rating::new(viewer.id, rated.id, stars, None, now).unwrap();
            h.feedback.insert_rating(&rating).await.unwrap();
        }

        let results = service(&h)
            .search(viewer.id, &SearchFilters::default())
            .await
            .unwrap();
        let view = &results.same_sector_and_level[0];
        assert_eq!(view.rating.count, 2);
        assert!((view.rating.average - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn ratings_loaded_in_one_read() {
        let now = at(2024, 4, 1, 9, 0, 0);
        let h = Harness::at(now);
        let viewer = h.seed("+258841000001").await;
        let first = h.seed("+258841000002").await;
        let second = h.seed("+258841000003").await;
        h.seed("+258841000004").await;

        for (rated, stars) in [(&first, 5), (&second, 2), (&second, 4)] {
            let rating = Rating::new(viewer.id, rated.id, stars, None, now).unwrap();
            h.feedback.insert_rating(&rating).await.unwrap();
        }

        let results = service(&h)
            .search(viewer.id, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(results.total(), 3);
        assert_eq!(h.feedback.rating_reads(), 1);

        let all: Vec<&MatchView> = results.same_sector_and_level.iter().collect();
        let count_for = |id: Uuid| all.iter().find(|m| m.id == id).map(|m| m.rating.count);
        assert_eq!(count_for(first.id), Some(1));
        assert_eq!(count_for(second.id), Some(2));
    }
}
