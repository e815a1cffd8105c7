use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::user::Location;

/// Which location pair of a profile was edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationField {
    Current,
    Desired,
}

impl LocationField {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationField::Current => "current",
            LocationField::Desired => "desired",
        }
    }
}

impl FromStr for LocationField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(LocationField::Current),
            "desired" => Ok(LocationField::Desired),
            other => Err(format!(
                "Invalid location type: {} (expected current or desired)",
                other
            )),
        }
    }
}

impl fmt::Display for LocationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit entry written with every successful location edit.
///
/// Records are never updated or deleted, including when the account they
/// belong to is removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub field: LocationField,
    pub old: Location,
    pub new: Location,
    pub edited_at: DateTime<Utc>,
}

impl LocationHistoryRecord {
    pub fn new(
        user_id: Uuid,
        field: LocationField,
        old: Location,
        new: Location,
        edited_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            field,
            old,
            new,
            edited_at,
        }
    }
}
