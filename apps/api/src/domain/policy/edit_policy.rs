//! Field-edit governance.
//!
//! One table decides, for every profile field category, whether a user may
//! change it at a given instant and when it next becomes eligible:
//!
//! | Category            | Rule                                              |
//! |---------------------|---------------------------------------------------|
//! | first/last name, sector | never editable after registration             |
//! | current location    | at most once per account                          |
//! | salary level + grade | once every 2 years since last edit or creation   |
//! | desired location    | once per day (premium) or per 30 days (free)      |

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::history::{LocationField, LocationHistoryRecord};
use crate::domain::user::{Grade, Location, SalaryLevel, UserProfile};

pub const SALARY_EDIT_INTERVAL_MONTHS: u32 = 24;
pub const PREMIUM_DESIRED_EDIT_INTERVAL_DAYS: i64 = 1;
pub const FREE_DESIRED_EDIT_INTERVAL_DAYS: i64 = 30;

/// Profile field categories subject to edit governance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditCategory {
    FirstName,
    LastName,
    Sector,
    CurrentLocation,
    SalaryLevel,
    DesiredLocation,
}

impl EditCategory {
    pub const ALL: [EditCategory; 6] = [
        EditCategory::FirstName,
        EditCategory::LastName,
        EditCategory::Sector,
        EditCategory::CurrentLocation,
        EditCategory::SalaryLevel,
        EditCategory::DesiredLocation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EditCategory::FirstName => "firstName",
            EditCategory::LastName => "lastName",
            EditCategory::Sector => "sector",
            EditCategory::CurrentLocation => "currentLocation",
            EditCategory::SalaryLevel => "salaryLevel",
            EditCategory::DesiredLocation => "desiredLocation",
        }
    }
}

impl fmt::Display for EditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of [`evaluate_edit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDecision {
    pub allowed: bool,
    /// When a denied category opens again; `None` if allowed or never.
    pub next_eligible_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl EditDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            next_eligible_at: None,
            reason: None,
        }
    }

    fn deny(reason: impl Into<String>, next_eligible_at: Option<DateTime<Utc>>) -> Self {
        Self {
            allowed: false,
            next_eligible_at,
            reason: Some(reason.into()),
        }
    }

    /// Converts a denial into [`DomainError::PolicyViolation`].
    pub fn into_result(self) -> DomainResult<()> {
        if self.allowed {
            return Ok(());
        }
        Err(DomainError::PolicyViolation {
            reason: self
                .reason
                .unwrap_or_else(|| "Edit not allowed".to_string()),
            next_eligible_at: self.next_eligible_at,
        })
    }
}

/// Decides whether `category` may be edited at `now`.
///
/// Pure: depends only on the snapshot, the category and `now`. The plan in
/// force at `now` drives the desired-location cadence, not the plan the user
/// had at their previous edit.
///
/// # Example
/// ```
/// use permuta_api::domain::policy::edit_policy::{evaluate_edit, EditCategory};
/// # use permuta_api::domain::user::*;
/// # use chrono::{TimeZone, Utc};
/// # let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// # let user = UserProfile::register(NewUser {
/// #     phone: Phone::new("+258841234567").unwrap(), email: None,
/// #     password_hash: String::new(), first_name: "Ana".into(), last_name: "M".into(),
/// #     sector: Sector::new("Saúde").unwrap(), salary_level: SalaryLevel::new(5).unwrap(),
/// #     grade: Grade::A, current_location: Location::new("Sofala", "Beira").unwrap(),
/// #     desired_location: Location::new("Gaza", "Chibuto").unwrap(),
/// # }, now);
/// assert!(!evaluate_edit(&user, EditCategory::FirstName, now).allowed);
/// assert!(evaluate_edit(&user, EditCategory::CurrentLocation, now).allowed);
/// ```
pub fn evaluate_edit(user: &UserProfile, category: EditCategory, now: DateTime<Utc>) -> EditDecision {
    match category {
        EditCategory::FirstName | EditCategory::LastName | EditCategory::Sector => {
            EditDecision::deny(format!("{} cannot be changed after registration", category), None)
        }
        EditCategory::CurrentLocation => match user.edits.current_location {
            None => EditDecision::allow(),
            Some(_) => EditDecision::deny("Current location can only be changed once", None),
        },
        EditCategory::SalaryLevel => {
            let anchor = user.edits.salary.unwrap_or(user.created_at);
            match anchor.checked_add_months(Months::new(SALARY_EDIT_INTERVAL_MONTHS)) {
                Some(next) if now >= next => EditDecision::allow(),
                Some(next) => EditDecision::deny(
                    "Salary level and grade can only be changed once every 2 years",
                    Some(next),
                ),
                None => EditDecision::deny("Salary level and grade cannot be changed", None),
            }
        }
        EditCategory::DesiredLocation => {
            let Some(last) = user.edits.desired_location else {
                return EditDecision::allow();
            };
            let (interval, reason) = if user.has_active_premium(now) {
                (
                    Duration::days(PREMIUM_DESIRED_EDIT_INTERVAL_DAYS),
                    "Desired location can only be changed once per day",
                )
            } else {
                (
                    Duration::days(FREE_DESIRED_EDIT_INTERVAL_DAYS),
                    "Desired location can only be changed once every 30 days on the free plan",
                )
            };
            let next = last + interval;
            if now >= next {
                EditDecision::allow()
            } else {
                EditDecision::deny(reason, Some(next))
            }
        }
    }
}

/// A requested change to a governed profile field.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileEdit {
    CurrentLocation(Location),
    DesiredLocation(Location),
    SalaryAndGrade { level: SalaryLevel, grade: Grade },
}

impl ProfileEdit {
    pub fn category(&self) -> EditCategory {
        match self {
            ProfileEdit::CurrentLocation(_) => EditCategory::CurrentLocation,
            ProfileEdit::DesiredLocation(_) => EditCategory::DesiredLocation,
            ProfileEdit::SalaryAndGrade { .. } => EditCategory::SalaryLevel,
        }
    }
}

/// Result of applying an allowed edit to a snapshot.
///
/// `previous_marker` is the category marker the decision was based on; the
/// store only commits the edit if the marker is still unchanged.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub updated: UserProfile,
    pub history: Option<LocationHistoryRecord>,
    pub previous_marker: Option<DateTime<Utc>>,
}

/// Evaluates and, if allowed, applies `edit` to a copy of `user`.
pub fn apply_edit(user: &UserProfile, edit: ProfileEdit, now: DateTime<Utc>) -> DomainResult<EditOutcome> {
    evaluate_edit(user, edit.category(), now).into_result()?;

    let mut updated = user.clone();
    updated.profile_last_updated = now;

    let (previous_marker, history) = match edit {
        ProfileEdit::CurrentLocation(location) => {
            let previous = updated.edits.current_location.replace(now);
            let old = std::mem::replace(&mut updated.current_location, location.clone());
            let record = LocationHistoryRecord::new(user.id, LocationField::Current, old, location, now);
            (previous, Some(record))
        }
        ProfileEdit::DesiredLocation(location) => {
            let previous = updated.edits.desired_location.replace(now);
            let old = std::mem::replace(&mut updated.desired_location, location.clone());
            let record = LocationHistoryRecord::new(user.id, LocationField::Desired, old, location, now);
            (previous, Some(record))
        }
        ProfileEdit::SalaryAndGrade { level, grade } => {
            let previous = updated.edits.salary.replace(now);
            updated.salary_level = level;
            updated.grade = grade;
            (previous, None)
        }
    };

    Ok(EditOutcome {
        updated,
        history,
        previous_marker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::profile::fixtures::{at, user_created_at};

    fn premium(user: &mut UserProfile, expires_at: Option<DateTime<Utc>>) {
        user.premium.is_premium = true;
        user.premium.expires_at = expires_at;
    }

    #[test]
    fn immutable_fields_always_denied() {
        let created = at(2020, 1, 1, 0, 0, 0);
        let mut user = user_created_at(created);
        user.is_admin = true;

        for category in [EditCategory::FirstName, EditCategory::LastName, EditCategory::Sector] {
            for now in [created, at(2030, 6, 1, 0, 0, 0), at(2099, 12, 31, 23, 59, 59)] {
                let decision = evaluate_edit(&user, category, now);
                assert!(!decision.allowed);
                assert_eq!(decision.next_eligible_at, None);
                assert!(decision.reason.is_some());
            }
        }
    }

    #[test]
    fn current_location_allowed_once() {
        let created = at(2024, 1, 1, 0, 0, 0);
        let user = user_created_at(created);
        let first = at(2024, 2, 1, 0, 0, 0);

        assert!(evaluate_edit(&user, EditCategory::CurrentLocation, first).allowed);

        let edit = ProfileEdit::CurrentLocation(Location::new("Tete", "Moatize").unwrap());
        let outcome = apply_edit(&user, edit, first).unwrap();

        for later in [first, at(2024, 2, 2, 0, 0, 0), at(2040, 1, 1, 0, 0, 0)] {
            let decision = evaluate_edit(&outcome.updated, EditCategory::CurrentLocation, later);
            assert!(!decision.allowed);
            assert_eq!(decision.next_eligible_at, None);
        }
    }

    #[test]
    fn salary_locked_for_two_years_from_creation() {
        let user = user_created_at(at(2023, 1, 1, 0, 0, 0));

        let decision = evaluate_edit(&user, EditCategory::SalaryLevel, at(2024, 6, 1, 0, 0, 0));
        assert!(!decision.allowed);
        assert_eq!(decision.next_eligible_at, Some(at(2025, 1, 1, 0, 0, 0)));

        let decision = evaluate_edit(&user, EditCategory::SalaryLevel, at(2025, 1, 1, 0, 0, 0));
        assert!(decision.allowed);
    }

    #[test]
    fn salary_boundary_one_second_early() {
        let user = user_created_at(at(2023, 1, 1, 0, 0, 0));
        let decision = evaluate_edit(&user, EditCategory::SalaryLevel, at(2024, 12, 31, 23, 59, 59));
        assert!(!decision.allowed);
    }

    #[test]
    fn salary_interval_measured_from_last_edit() {
        let user = user_created_at(at(2020, 1, 1, 0, 0, 0));
        let edited = at(2023, 5, 10, 12, 0, 0);
        let outcome = apply_edit(
            &user,
            ProfileEdit::SalaryAndGrade {
                level: SalaryLevel::new(12).unwrap(),
                grade: Grade::C,
            },
            edited,
        )
        .unwrap();

        assert!(outcome.history.is_none());
        assert_eq!(outcome.updated.salary_level.value(), 12);
        assert_eq!(outcome.updated.grade, Grade::C);

        let decision = evaluate_edit(&outcome.updated, EditCategory::SalaryLevel, at(2024, 1, 1, 0, 0, 0));
        assert_eq!(decision.next_eligible_at, Some(at(2025, 5, 10, 12, 0, 0)));
    }

    #[test]
    fn desired_location_never_edited_is_allowed() {
        let user = user_created_at(at(2024, 1, 1, 0, 0, 0));
        assert!(evaluate_edit(&user, EditCategory::DesiredLocation, at(2024, 1, 1, 0, 0, 1)).allowed);
    }

    #[test]
    fn premium_desired_location_daily_cadence() {
        let t = at(2024, 3, 10, 15, 0, 0);
        let mut user = user_created_at(at(2024, 1, 1, 0, 0, 0));
        premium(&mut user, Some(at(2025, 1, 1, 0, 0, 0)));
        user.edits.desired_location = Some(t);

        let denied = evaluate_edit(&user, EditCategory::DesiredLocation, t + Duration::hours(23));
        assert!(!denied.allowed);
        assert_eq!(denied.next_eligible_at, Some(t + Duration::days(1)));

        assert!(evaluate_edit(&user, EditCategory::DesiredLocation, t + Duration::hours(25)).allowed);
    }

    #[test]
    fn free_desired_location_monthly_cadence() {
        let t = at(2024, 3, 10, 15, 0, 0);
        let mut user = user_created_at(at(2024, 1, 1, 0, 0, 0));
        user.edits.desired_location = Some(t);

        let denied = evaluate_edit(&user, EditCategory::DesiredLocation, t + Duration::days(29));
        assert!(!denied.allowed);
        assert_eq!(denied.next_eligible_at, Some(t + Duration::days(30)));
        assert!(evaluate_edit(&user, EditCategory::DesiredLocation, t + Duration::days(30)).allowed);
    }

    #[test]
    fn plan_is_read_at_evaluation_time() {
        let t = at(2024, 3, 10, 15, 0, 0);
        let mut user = user_created_at(at(2024, 1, 1, 0, 0, 0));
        user.edits.desired_location = Some(t);

        // Free when it edited, premium now.
        premium(&mut user, Some(at(2024, 6, 1, 0, 0, 0)));
        assert!(evaluate_edit(&user, EditCategory::DesiredLocation, t + Duration::hours(25)).allowed);

        // Premium lapsed before the check, sweep not run yet.
        premium(&mut user, Some(t + Duration::hours(2)));
        assert!(!evaluate_edit(&user, EditCategory::DesiredLocation, t + Duration::hours(25)).allowed);
    }

    #[test]
    fn apply_edit_records_history_and_marker() {
        let user = user_created_at(at(2024, 1, 1, 0, 0, 0));
        let now = at(2024, 4, 1, 10, 0, 0);
        let new_location = Location::new("Nampula", "Angoche").unwrap();

        let outcome = apply_edit(&user, ProfileEdit::DesiredLocation(new_location.clone()), now).unwrap();

        assert_eq!(outcome.previous_marker, None);
        assert_eq!(outcome.updated.desired_location, new_location);
        assert_eq!(outcome.updated.edits.desired_location, Some(now));
        assert_eq!(outcome.updated.profile_last_updated, now);

        let record = outcome.history.unwrap();
        assert_eq!(record.field, LocationField::Desired);
        assert_eq!(record.old, user.desired_location);
        assert_eq!(record.new, new_location);
        assert_eq!(record.edited_at, now);
        assert_eq!(record.user_id, user.id);
    }

    #[test]
    fn apply_edit_denied_returns_policy_violation() {
        let user = user_created_at(at(2023, 1, 1, 0, 0, 0));
        let err = apply_edit(
            &user,
            ProfileEdit::SalaryAndGrade {
                level: SalaryLevel::new(3).unwrap(),
                grade: Grade::A,
            },
            at(2024, 6, 1, 0, 0, 0),
        )
        .unwrap_err();

        match err {
            DomainError::PolicyViolation { next_eligible_at, .. } => {
                assert_eq!(next_eligible_at, Some(at(2025, 1, 1, 0, 0, 0)));
            }
            other => panic!("expected PolicyViolation, got {:?}", other),
        }
    }
}
