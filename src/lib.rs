/// Public library interface for the habit store
///
/// This module exports the `HabitStore` facade and the public types that can
/// be used by applications or tests. The facade accepts plain strings, turns
/// them into validated domain values and delegates to the storage layer.

use chrono::{DateTime, Utc};

// Internal modules
mod domain;
mod storage;
mod snapshot;
pub mod config;
pub mod logging;

// Re-export public modules and types
pub use domain::*;
pub use storage::{ErrorKind, HabitStorage, SqliteStorage, StorageError};
pub use snapshot::Snapshot;
pub use config::StoreConfig;

/// Habit store backed by SQLite
///
/// The store can be shared between threads (`Arc<HabitStore>`); each call
/// runs as one short transaction and every constraint violation comes back
/// as a `StorageError` whose `kind()` identifies it.
pub struct HabitStore {
    storage: SqliteStorage,
}

impl HabitStore {
    /// Open a store as described by the configuration
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        tracing::info!("Opening habit store: {:?}", config);
        let storage = SqliteStorage::open(config)?;
        Ok(Self { storage })
    }

    /// Open a store in a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Create a habit with a caller-assigned id
    pub fn create_habit(&self, id: &str, name: &str) -> Result<Habit, StorageError> {
        let input = NewHabit::new(HabitId::new(id)?, name)?;
        self.storage.create_habit(&input)
    }

    /// Create a habit with an explicit creation time
    pub fn create_habit_at(
        &self,
        id: &str,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Habit, StorageError> {
        let input = NewHabit::new(HabitId::new(id)?, name)?.with_created_at(created_at)?;
        self.storage.create_habit(&input)
    }

    /// Look up a habit; an id that could never be stored is simply not found
    pub fn get_habit(&self, id: &str) -> Result<Habit, StorageError> {
        let habit_id = lookup_id(id).ok_or_else(|| not_found(id))?;
        self.storage.get_habit(&habit_id)
    }

    pub fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        self.storage.list_habits()
    }

    /// Delete a habit and, atomically, all of its stats
    pub fn delete_habit(&self, id: &str) -> Result<(), StorageError> {
        let habit_id = lookup_id(id).ok_or_else(|| not_found(id))?;
        self.storage.delete_habit(&habit_id)
    }

    /// Record whether a habit was done on a date; insert-only
    pub fn record_stat(
        &self,
        date: &str,
        habit_id: &str,
        status: bool,
    ) -> Result<DailyStat, StorageError> {
        self.storage
            .record_stat(&StatDate::new(date)?, &HabitId::new(habit_id)?, status)
    }

    /// Record a raw 0/1 status value, rejecting anything else
    pub fn record_stat_value(
        &self,
        date: &str,
        habit_id: &str,
        status: i64,
    ) -> Result<DailyStat, StorageError> {
        let status = status_from_int(status)?;
        self.record_stat(date, habit_id, status)
    }

    /// Record a status, overwriting any existing record for the same day
    pub fn set_stat(
        &self,
        date: &str,
        habit_id: &str,
        status: bool,
    ) -> Result<DailyStat, StorageError> {
        self.storage
            .set_stat(&StatDate::new(date)?, &HabitId::new(habit_id)?, status)
    }

    /// Flip the status for a day
    pub fn toggle_stat(&self, date: &str, habit_id: &str) -> Result<DailyStat, StorageError> {
        self.storage
            .toggle_stat(&StatDate::new(date)?, &HabitId::new(habit_id)?)
    }

    pub fn get_stat(&self, date: &str, habit_id: &str) -> Result<Option<DailyStat>, StorageError> {
        let date = StatDate::new(date)?;
        match lookup_id(habit_id) {
            Some(habit_id) => self.storage.get_stat(&date, &habit_id),
            None => Ok(None),
        }
    }

    /// All habit statuses recorded for a day, ordered by habit id
    pub fn list_stats_by_date(&self, date: &str) -> Result<Vec<DailyStat>, StorageError> {
        self.storage.list_stats_by_date(&StatDate::new(date)?)
    }

    /// All statuses recorded for a habit, ordered by date
    pub fn list_stats_by_habit(&self, habit_id: &str) -> Result<Vec<DailyStat>, StorageError> {
        match lookup_id(habit_id) {
            Some(habit_id) => self.storage.list_stats_by_habit(&habit_id),
            None => Ok(Vec::new()),
        }
    }

    /// All statuses with a date between `start` and `end`, inclusive
    pub fn list_stats_in_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<DailyStat>, StorageError> {
        self.storage
            .list_stats_in_range(&StatDate::new(start)?, &StatDate::new(end)?)
    }

    pub fn snapshot(&self) -> Result<Snapshot, StorageError> {
        self.storage.snapshot()
    }

    /// Replace the whole store content; nothing changes if any row is rejected
    pub fn restore_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.storage.restore_snapshot(snapshot)
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}

/// Parse an id used only to look something up
fn lookup_id(id: &str) -> Option<HabitId> {
    HabitId::new(id).ok()
}

fn not_found(id: &str) -> StorageError {
    StorageError::HabitNotFound {
        habit_id: id.to_string(),
    }
}
