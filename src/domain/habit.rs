/// Habit entity and related functionality
///
/// This module defines the Habit struct as it is persisted, and NewHabit,
/// the validated input used to create one.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Datelike, Utc};
use crate::domain::{HabitId, DomainError};

/// Maximum length of a habit name, in characters
pub const MAX_HABIT_NAME_LEN: usize = 255;

/// Latest year a stored timestamp can carry (RFC 3339 has four-digit years)
pub const MAX_TIMESTAMP_YEAR: i32 = 9999;

/// A habit represents a named recurring activity the user tracks
///
/// Habits are keyed by a caller-assigned id and are never modified after
/// creation. Deleting a habit removes all of its daily stats with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Display name (e.g., "Drink Water", "Read for 30min")
    pub name: String,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a habit
///
/// When `created_at` is left empty the store stamps the row with the moment
/// of insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub id: HabitId,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewHabit {
    /// Create new habit input with validation
    pub fn new(id: HabitId, name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            id,
            name,
            created_at: None,
        })
    }

    /// Use an explicit creation timestamp instead of the insertion time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Result<Self, DomainError> {
        validate_created_at(&created_at)?;
        self.created_at = Some(created_at);
        Ok(self)
    }
}

/// Validate habit name according to business rules
///
/// The schema only requires a non-null name of at most 255 characters; an
/// empty or whitespace-only name is schema-legal but meaningless, so it is
/// rejected here.
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidHabitName(
            "Habit name cannot be empty".to_string()
        ));
    }

    let len = name.chars().count();
    if len > MAX_HABIT_NAME_LEN {
        return Err(DomainError::InvalidHabitName(format!(
            "Habit name cannot be longer than {} characters, got {}",
            MAX_HABIT_NAME_LEN, len
        )));
    }

    Ok(())
}

/// Validate that a timestamp can be stored and read back as RFC 3339
pub fn validate_created_at(created_at: &DateTime<Utc>) -> Result<(), DomainError> {
    let year = created_at.year();
    if !(0..=MAX_TIMESTAMP_YEAR).contains(&year) {
        return Err(DomainError::InvalidTimestamp(format!(
            "Year must be between 0 and {}, got {}",
            MAX_TIMESTAMP_YEAR, year
        )));
    }

    Ok(())
}
