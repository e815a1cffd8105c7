use serde::Serialize;

use crate::domain::user::UserProfile;

pub const MUTUAL_LOCATION_WEIGHT: u8 = 50;
pub const SAME_SECTOR_WEIGHT: u8 = 20;
pub const SAME_SALARY_LEVEL_WEIGHT: u8 = 15;
pub const SAME_GRADE_WEIGHT: u8 = 15;
pub const MAX_SCORE: u8 = 100;

/// Minimum score for a candidate to count as a priority match.
pub const PRIORITY_THRESHOLD: u8 = 80;

/// Where a candidate lands in the viewer's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchBucket {
    /// Score of at least [`PRIORITY_THRESHOLD`].
    Priority,
    /// Below the threshold, but same sector and salary level.
    SameSectorAndLevel,
    Excluded,
}

/// True when each side wants to go exactly where the other currently is.
pub fn is_mutual_location_match(viewer: &UserProfile, candidate: &UserProfile) -> bool {
    candidate.desired_location == viewer.current_location
        && viewer.desired_location == candidate.current_location
}

/// Scores `candidate` from `viewer`'s point of view, in `0..=100`.
///
/// The location term needs both directions to match. The function is not
/// guaranteed symmetric: the rule set happens to be, but callers must not
/// rely on `score(a, b) == score(b, a)`.
pub fn compute_compatibility(viewer: &UserProfile, candidate: &UserProfile) -> u8 {
    let mut score: u8 = 0;

    if is_mutual_location_match(viewer, candidate) {
        score += MUTUAL_LOCATION_WEIGHT;
    }
    if candidate.sector == viewer.sector {
        score += SAME_SECTOR_WEIGHT;
    }
    if candidate.salary_level == viewer.salary_level {
        score += SAME_SALARY_LEVEL_WEIGHT;
    }
    if candidate.grade == viewer.grade {
        score += SAME_GRADE_WEIGHT;
    }

    score.min(MAX_SCORE)
}

pub fn classify(viewer: &UserProfile, candidate: &UserProfile, score: u8) -> MatchBucket {
    if score >= PRIORITY_THRESHOLD {
        MatchBucket::Priority
    } else if candidate.sector == viewer.sector && candidate.salary_level == viewer.salary_level {
        MatchBucket::SameSectorAndLevel
    } else {
        MatchBucket::Excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::profile::fixtures::{at, new_user};
    use crate::domain::user::{Grade, Location, SalaryLevel, Sector};

    fn profile(phone: &str, current: (&str, &str), desired: (&str, &str)) -> UserProfile {
        let mut user = UserProfile::register(new_user(phone), at(2024, 1, 1, 0, 0, 0));
        user.current_location = Location::new(current.0, current.1).unwrap();
        user.desired_location = Location::new(desired.0, desired.1).unwrap();
        user
    }

    fn swap_pair() -> (UserProfile, UserProfile) {
        let viewer = profile("+258840000001", ("Sofala", "Beira"), ("Gaza", "Xai-Xai"));
        let candidate = profile("+258840000002", ("Gaza", "Xai-Xai"), ("Sofala", "Beira"));
        (viewer, candidate)
    }

    #[test]
    fn perfect_match_scores_hundred() {
        let (viewer, candidate) = swap_pair();
        assert_eq!(compute_compatibility(&viewer, &candidate), 100);
        assert_eq!(classify(&viewer, &candidate, 100), MatchBucket::Priority);
    }

    #[test]
    fn one_directional_match_gets_no_location_points() {
        let viewer = profile("+258840000001", ("Sofala", "Beira"), ("Gaza", "Xai-Xai"));
        // Candidate is where the viewer wants to go, but wants to go elsewhere.
        let candidate = profile("+258840000002", ("Gaza", "Xai-Xai"), ("Tete", "Moatize"));

        assert!(!is_mutual_location_match(&viewer, &candidate));
        assert_eq!(compute_compatibility(&viewer, &candidate), 50);
    }

    #[test]
    fn directional_inputs_are_checked_not_assumed() {
        let viewer = profile("+258840000001", ("Sofala", "Beira"), ("Gaza", "Xai-Xai"));
        let mut candidate = profile("+258840000002", ("Gaza", "Xai-Xai"), ("Tete", "Moatize"));
        candidate.grade = Grade::A;

        let forward = compute_compatibility(&viewer, &candidate);
        let backward = compute_compatibility(&candidate, &viewer);
        assert_eq!(forward, 35);
        // Current weights make the two directions agree; the contract does not promise it.
        assert_eq!(forward, backward);
    }

    #[test]
    fn same_province_other_district_is_not_a_match() {
        let viewer = profile("+258840000001", ("Sofala", "Beira"), ("Gaza", "Xai-Xai"));
        let candidate = profile("+258840000002", ("Gaza", "Chibuto"), ("Sofala", "Beira"));
        assert!(!is_mutual_location_match(&viewer, &candidate));
    }

    #[test]
    fn partial_attribute_matches() {
        let (viewer, mut candidate) = swap_pair();
        candidate.sector = Sector::new("Saúde").unwrap();
        candidate.salary_level = SalaryLevel::new(3).unwrap();
        candidate.grade = Grade::C;

        assert_eq!(compute_compatibility(&viewer, &candidate), 50);
        assert_eq!(classify(&viewer, &candidate, 50), MatchBucket::Excluded);
    }

    #[test]
    fn same_sector_and_level_bucket() {
        let viewer = profile("+258840000001", ("Sofala", "Beira"), ("Gaza", "Xai-Xai"));
        let candidate = profile("+258840000002", ("Tete", "Moatize"), ("Niassa", "Lichinga"));

        let score = compute_compatibility(&viewer, &candidate);
        assert_eq!(score, 50);
        assert_eq!(classify(&viewer, &candidate, score), MatchBucket::SameSectorAndLevel);
    }

    #[test]
    fn score_always_within_bounds() {
        let sectors = ["Educação", "Saúde"];
        let levels = [1, 21];
        let grades = [Grade::A, Grade::C];
        let (viewer, base) = swap_pair();

        for sector in sectors {
            for level in levels {
                for grade in grades {
                    for mutual in [true, false] {
                        let mut candidate = base.clone();
                        candidate.sector = Sector::new(sector).unwrap();
                        candidate.salary_level = SalaryLevel::new(level).unwrap();
                        candidate.grade = grade;
                        if !mutual {
                            candidate.desired_location = Location::new("Tete", "Tete").unwrap();
                        }
                        let score = compute_compatibility(&viewer, &candidate);
                        assert!(score <= MAX_SCORE);
                    }
                }
            }
        }
    }
}
