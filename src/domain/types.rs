/// Identifier and date types used throughout the domain layer
///
/// HabitId and StatDate are validated wrappers around strings. Once one of
/// these values exists it is guaranteed to fit the column it is stored in.

use std::fmt;

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::DomainError;

/// Maximum length of a habit identifier, in characters
pub const MAX_HABIT_ID_LEN: usize = 50;

/// Exact length of a stat date, in characters
pub const STAT_DATE_LEN: usize = 8;

/// Format used by `StatDate::from_naive` and `StatDate::to_naive`
pub const STAT_DATE_FORMAT: &str = "%Y%m%d";

/// Unique identifier for a habit
///
/// Habit ids are assigned by the caller, not by the store. This wrapper
/// guarantees the id is non-empty and at most 50 characters long, so you
/// can't accidentally pass an arbitrary string where a habit key is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HabitId(String);

impl HabitId {
    /// Create a habit ID from a caller-supplied string
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let len = id.chars().count();

        if len == 0 {
            return Err(DomainError::InvalidHabitId(
                "Habit id cannot be empty".to_string()
            ));
        }

        if len > MAX_HABIT_ID_LEN {
            return Err(DomainError::InvalidHabitId(format!(
                "Habit id cannot be longer than {} characters, got {}",
                MAX_HABIT_ID_LEN, len
            )));
        }

        Ok(Self(id))
    }

    /// Generate a fresh random habit ID for callers without a natural key
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HabitId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HabitId> for String {
    fn from(id: HabitId) -> Self {
        id.0
    }
}

/// Calendar day a stat is recorded for
///
/// The store only requires a fixed width of 8 characters. The conventional
/// layout is `YYYYMMDD`, which is what `from_naive` produces; because that
/// layout sorts lexicographically in date order, range queries work on the
/// raw column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatDate(String);

impl StatDate {
    /// Create a stat date from an 8-character string
    pub fn new(date: impl Into<String>) -> Result<Self, DomainError> {
        let date = date.into();
        let len = date.chars().count();

        if len != STAT_DATE_LEN {
            return Err(DomainError::InvalidDate(format!(
                "Date must be exactly {} characters, got {:?} ({} characters)",
                STAT_DATE_LEN, date, len
            )));
        }

        Ok(Self(date))
    }

    /// Build a `YYYYMMDD` stat date from a calendar date
    pub fn from_naive(date: NaiveDate) -> Result<Self, DomainError> {
        Self::new(date.format(STAT_DATE_FORMAT).to_string())
    }

    /// Today's date (UTC) as a stat date
    pub fn today() -> Self {
        // chrono's current date is always within 4-digit years
        Self(Utc::now().date_naive().format(STAT_DATE_FORMAT).to_string())
    }

    /// Parse this date back into a calendar date, assuming `YYYYMMDD`
    pub fn to_naive(&self) -> Result<NaiveDate, DomainError> {
        NaiveDate::parse_from_str(&self.0, STAT_DATE_FORMAT).map_err(|e| {
            DomainError::InvalidDate(format!("{:?} is not a YYYYMMDD date: {}", self.0, e))
        })
    }

    /// Borrow the date as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StatDate {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StatDate> for String {
    fn from(date: StatDate) -> Self {
        date.0
    }
}
