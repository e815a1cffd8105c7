use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

/// A star rating one user leaves for another. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub rated_user_id: Uuid,
    pub stars: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// # Business Rules
    /// - Stars between 1 and 5
    /// - Users cannot rate themselves
    pub fn new(
        rater_id: Uuid,
        rated_user_id: Uuid,
        stars: i64,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        if rater_id == rated_user_id {
            return Err("You cannot rate yourself".to_string());
        }
        if !(MIN_STARS as i64..=MAX_STARS as i64).contains(&stars) {
            return Err(format!(
                "Rating must be between {} and {} stars",
                MIN_STARS, MAX_STARS
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            rater_id,
            rated_user_id,
            stars: stars as u8,
            comment: comment.filter(|c| !c.trim().is_empty()),
            created_at: now,
        })
    }
}

/// Derived rating aggregate; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average: f64,
    pub count: u32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        if ratings.is_empty() {
            return Self {
                average: 0.0,
                count: 0,
            };
        }
        let total: u32 = ratings.iter().map(|r| r.stars as u32).sum();
        Self {
            average: total as f64 / ratings.len() as f64,
            count: ratings.len() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ReportStatus::Pending),
            "reviewed" => Some(ReportStatus::Reviewed),
            "resolved" => Some(ReportStatus::Resolved),
            _ => None,
        }
    }
}

/// A complaint about another user, reviewed by admins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        reporter_id: Uuid,
        reported_user_id: Uuid,
        reason: String,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        if reporter_id == reported_user_id {
            return Err("You cannot report yourself".to_string());
        }
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err("A reason is required".to_string());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            reporter_id,
            reported_user_id,
            reason,
            description: description.filter(|d| !d.trim().is_empty()),
            status: ReportStatus::Pending,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn rating_bounds() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(Rating::new(a, b, 1, None, now()).is_ok());
        assert!(Rating::new(a, b, 5, None, now()).is_ok());
        assert!(Rating::new(a, b, 0, None, now()).is_err());
        assert!(Rating::new(a, b, 6, None, now()).is_err());
    }

    #[test]
    fn self_rating_rejected() {
        let a = Uuid::new_v4();
        assert!(Rating::new(a, a, 5, None, now()).is_err());
    }

    #[test]
    fn summary_average() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ratings = vec![
            Rating::new(a, b, 5, None, now()).unwrap(),
            Rating::new(a, b, 4, Some("ok".into()), now()).unwrap(),
            Rating::new(a, b, 3, None, now()).unwrap(),
        ];
        let summary = RatingSummary::from_ratings(&ratings);
        assert_eq!(summary.count, 3);
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_summary() {
        let summary = RatingSummary::from_ratings(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
    }

    #[test]
    fn report_requires_reason() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(Report::new(a, b, "   ".into(), None, now()).is_err());
        let report = Report::new(a, b, " spam ".into(), Some("".into()), now()).unwrap();
        assert_eq!(report.reason, "spam");
        assert_eq!(report.description, None);
        assert_eq!(report.status, ReportStatus::Pending);
    }
}
