/// Storage layer for persisting habit data
///
/// This module handles all database operations using SQLite. It provides
/// a clean interface for storing and retrieving habits and their daily stats,
/// and turns constraint failures into distinct, identifiable errors.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use std::os::raw::c_int;

use rusqlite::ErrorCode;
use thiserror::Error;
use crate::domain::{DailyStat, DomainError, Habit, HabitId, NewHabit, StatDate};
use crate::snapshot::Snapshot;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Habit already exists: {habit_id}")]
    DuplicateHabit { habit_id: String },

    #[error("Duplicate stat: habit {habit_id} already recorded for date {date}")]
    DuplicateStat { habit_id: String, date: String },

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Stat references unknown habit: {habit_id}")]
    UnknownHabit { habit_id: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    Invalid(#[from] DomainError),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Coarse classification of storage errors
///
/// Callers that only care about which invariant was violated can match on
/// this instead of the individual `StorageError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A primary key or unique constraint was violated
    DuplicateKey,
    /// The referenced habit does not exist
    NotFound,
    /// A stat referenced a habit that does not exist
    ForeignKeyViolation,
    /// Any other integrity failure (status domain, field length, empty name)
    ConstraintViolation,
    /// The database itself failed; not related to the data
    Storage,
}

impl StorageError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::DuplicateHabit { .. } | StorageError::DuplicateStat { .. } => {
                ErrorKind::DuplicateKey
            }
            StorageError::HabitNotFound { .. } => ErrorKind::NotFound,
            StorageError::UnknownHabit { .. } => ErrorKind::ForeignKeyViolation,
            StorageError::ConstraintViolation(_) | StorageError::Invalid(_) => {
                ErrorKind::ConstraintViolation
            }
            StorageError::Connection(_)
            | StorageError::Query(_)
            | StorageError::Serialization(_)
            | StorageError::Migration(_) => ErrorKind::Storage,
        }
    }
}

/// Which constraint a failed statement tripped over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Duplicate,
    ForeignKey,
    Other,
}

/// Inspect a rusqlite error for a constraint violation
///
/// Returns `None` when the error is not a constraint failure at all.
pub(crate) fn violation(err: &rusqlite::Error) -> Option<Violation> {
    match err {
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation => {
            Some(classify_extended_code(code.extended_code))
        }
        _ => None,
    }
}

fn classify_extended_code(extended_code: c_int) -> Violation {
    match extended_code {
        rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
            Violation::Duplicate
        }
        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Violation::ForeignKey,
        _ => Violation::Other,
    }
}

/// Trait defining the storage interface for habits and daily stats
///
/// All invariants (unique keys, referential integrity, cascading deletes)
/// are enforced by the implementation, not by its callers.
pub trait HabitStorage {
    /// Create a new habit; fails with a duplicate error if the id is taken
    fn create_habit(&self, habit: &NewHabit) -> Result<Habit, StorageError>;

    /// Get a habit by ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// List all habits, oldest first
    fn list_habits(&self) -> Result<Vec<Habit>, StorageError>;

    /// Delete a habit together with all of its stats
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// Insert a stat; rejects a second record for the same date and habit
    fn record_stat(
        &self,
        date: &StatDate,
        habit_id: &HabitId,
        status: bool,
    ) -> Result<DailyStat, StorageError>;

    /// Insert a stat or overwrite the status of the existing one
    fn set_stat(
        &self,
        date: &StatDate,
        habit_id: &HabitId,
        status: bool,
    ) -> Result<DailyStat, StorageError>;

    /// Flip the status for a date and habit (a missing record counts as not done)
    fn toggle_stat(&self, date: &StatDate, habit_id: &HabitId) -> Result<DailyStat, StorageError>;

    /// Get the stat for a date and habit, if one was recorded
    fn get_stat(
        &self,
        date: &StatDate,
        habit_id: &HabitId,
    ) -> Result<Option<DailyStat>, StorageError>;

    /// All stats recorded for one day
    fn list_stats_by_date(&self, date: &StatDate) -> Result<Vec<DailyStat>, StorageError>;

    /// All stats recorded for one habit
    fn list_stats_by_habit(&self, habit_id: &HabitId) -> Result<Vec<DailyStat>, StorageError>;

    /// All stats with a date in `start..=end`
    fn list_stats_in_range(
        &self,
        start: &StatDate,
        end: &StatDate,
    ) -> Result<Vec<DailyStat>, StorageError>;

    /// Read the full store content in one consistent view
    fn snapshot(&self) -> Result<Snapshot, StorageError>;

    /// Replace the full store content with a snapshot
    fn restore_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError>;
}
