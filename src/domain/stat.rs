/// DailyStat entity for per-day completion records
///
/// A DailyStat says whether one habit was completed on one day. There is at
/// most one per (date, habit) pair.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{DomainError, HabitId, StatDate};

/// A single day's completion record for one habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    /// Surrogate key assigned by the store; carries no meaning beyond uniqueness
    pub id: i64,
    /// Which day this record is for
    pub date: StatDate,
    /// Which habit this record is for
    pub habit_id: HabitId,
    /// Whether the habit was completed that day
    pub status: bool,
    /// When this record was inserted
    pub created_at: DateTime<Utc>,
}

/// Convert a stored status value into a completion flag
///
/// Only 0 and 1 are accepted; anything else is rejected rather than coerced.
pub fn status_from_int(value: i64) -> Result<bool, DomainError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DomainError::InvalidStatus(other)),
    }
}

/// Convert a completion flag into its stored status value
pub fn status_to_int(status: bool) -> i64 {
    i64::from(status)
}
