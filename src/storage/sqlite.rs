/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habits and daily stats. It handles all SQL queries, data
/// conversion, and the mapping of constraint failures to storage errors.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::StoreConfig;
use crate::domain::{
    status_from_int, status_to_int, validate_created_at, DailyStat, Habit, HabitId, NewHabit,
    StatDate,
};
use crate::snapshot::Snapshot;
use crate::storage::{migrations, violation, HabitStorage, StorageError, Violation};

const HABIT_COLUMNS: &str = "id, name, created_at";
const STAT_COLUMNS: &str = "id, date, habit_id, status, created_at";

/// SQLite-based storage implementation
///
/// The connection sits behind a mutex so the storage can be shared between
/// threads; every operation holds the lock for one short transaction.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        Self::open(&StoreConfig::at(db_path))
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Open the database described by a configuration
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        let conn = if config.in_memory {
            Connection::open_in_memory().map_err(|e| {
                StorageError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            let db_path = config.resolve_database_path().map_err(|e| {
                StorageError::Connection(format!("Failed to prepare database location: {}", e))
            })?;
            let conn = Connection::open(&db_path)
                .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
            tracing::info!("SQLite storage initialized at: {:?}", db_path);
            conn
        };

        Self::from_connection(conn, config)
    }

    fn from_connection(conn: Connection, config: &StoreConfig) -> Result<Self, StorageError> {
        // Cascading deletes depend on this being on for every connection
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| StorageError::Connection(format!("Failed to set busy timeout: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Database connection lock poisoned".to_string()))
    }
}

/// Format a timestamp with nine fraction digits, like the schema default
///
/// Every stored value has the same width, so text order is time order and
/// nothing below the millisecond is lost.
fn timestamp_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

/// Map a row selected with `HABIT_COLUMNS`
fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let id_str: String = row.get(0)?;
    let id = HabitId::new(id_str).map_err(|e| conversion_failure(0, e))?;

    let created_at_str: String = row.get(2)?;
    let created_at = parse_timestamp(2, &created_at_str)?;

    Ok(Habit {
        id,
        name: row.get(1)?,
        created_at,
    })
}

/// Map a row selected with `STAT_COLUMNS`
fn stat_from_row(row: &Row<'_>) -> rusqlite::Result<DailyStat> {
    let date_str: String = row.get(1)?;
    let date = StatDate::new(date_str).map_err(|e| conversion_failure(1, e))?;

    let habit_id_str: String = row.get(2)?;
    let habit_id = HabitId::new(habit_id_str).map_err(|e| conversion_failure(2, e))?;

    let status_value: i64 = row.get(3)?;
    let status = status_from_int(status_value).map_err(|e| conversion_failure(3, e))?;

    let created_at_str: String = row.get(4)?;
    let created_at = parse_timestamp(4, &created_at_str)?;

    Ok(DailyStat {
        id: row.get(0)?,
        date,
        habit_id,
        status,
        created_at,
    })
}

/// Translate a failed habit insert
fn habit_insert_error(err: rusqlite::Error, habit_id: &HabitId) -> StorageError {
    match violation(&err) {
        Some(Violation::Duplicate) => StorageError::DuplicateHabit {
            habit_id: habit_id.to_string(),
        },
        Some(_) => StorageError::ConstraintViolation(err.to_string()),
        None => StorageError::Query(err),
    }
}

/// Translate a failed stat insert or upsert
fn stat_write_error(err: rusqlite::Error, date: &StatDate, habit_id: &HabitId) -> StorageError {
    match violation(&err) {
        Some(Violation::Duplicate) => StorageError::DuplicateStat {
            habit_id: habit_id.to_string(),
            date: date.to_string(),
        },
        Some(Violation::ForeignKey) => StorageError::UnknownHabit {
            habit_id: habit_id.to_string(),
        },
        Some(Violation::Other) => StorageError::ConstraintViolation(err.to_string()),
        None => StorageError::Query(err),
    }
}

fn insert_habit(conn: &Connection, habit: &NewHabit) -> Result<Habit, StorageError> {
    let created_at_str: String = match &habit.created_at {
        Some(ts) => {
            validate_created_at(ts)?;
            conn.query_row(
                "INSERT INTO habits (id, name, created_at) VALUES (?1, ?2, ?3) RETURNING created_at",
                params![habit.id.as_str(), habit.name, timestamp_to_sql(ts)],
                |row| row.get::<_, String>(0),
            )
        }
        None => conn.query_row(
            "INSERT INTO habits (id, name) VALUES (?1, ?2) RETURNING created_at",
            params![habit.id.as_str(), habit.name],
            |row| row.get::<_, String>(0),
        ),
    }
    .map_err(|e| habit_insert_error(e, &habit.id))?;

    let created_at = parse_timestamp(0, &created_at_str)?;

    Ok(Habit {
        id: habit.id.clone(),
        name: habit.name.clone(),
        created_at,
    })
}

fn upsert_stat(
    conn: &Connection,
    date: &StatDate,
    habit_id: &HabitId,
    status: bool,
) -> Result<DailyStat, StorageError> {
    let sql = format!(
        "INSERT INTO stats (date, habit_id, status) VALUES (?1, ?2, ?3)
         ON CONFLICT (date, habit_id) DO UPDATE SET status = excluded.status
         RETURNING {}",
        STAT_COLUMNS
    );

    conn.query_row(
        &sql,
        params![date.as_str(), habit_id.as_str(), status_to_int(status)],
        stat_from_row,
    )
    .map_err(|e| stat_write_error(e, date, habit_id))
}

fn query_stats<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<DailyStat>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let stat_iter = stmt.query_map(params, stat_from_row)?;

    let mut stats = Vec::new();
    for stat in stat_iter {
        stats.push(stat?);
    }

    Ok(stats)
}

fn query_habits(conn: &Connection) -> Result<Vec<Habit>, StorageError> {
    let sql = format!(
        "SELECT {} FROM habits ORDER BY created_at ASC, id ASC",
        HABIT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let habit_iter = stmt.query_map([], habit_from_row)?;

    let mut habits = Vec::new();
    for habit in habit_iter {
        habits.push(habit?);
    }

    Ok(habits)
}

impl HabitStorage for SqliteStorage {
    /// Create a new habit in the database
    ///
    /// The row is only committed once the stored values have been read back.
    fn create_habit(&self, habit: &NewHabit) -> Result<Habit, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = insert_habit(&tx, habit)?;
        tx.commit()?;

        tracing::debug!("Created habit: {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Get a habit by its ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS);

        conn.query_row(&sql, params![habit_id.as_str()], habit_from_row)
            .optional()?
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })
    }

    fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let conn = self.lock()?;
        query_habits(&conn)
    }

    /// Delete a habit; its stats go with it in the same transaction
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cascaded: i64 = tx.query_row(
            "SELECT COUNT(*) FROM stats WHERE habit_id = ?1",
            params![habit_id.as_str()],
            |row| row.get(0),
        )?;

        let rows_affected = tx.execute(
            "DELETE FROM habits WHERE id = ?1",
            params![habit_id.as_str()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tx.commit()?;

        tracing::debug!("Deleted habit: {} (cascaded {} stats)", habit_id, cascaded);
        Ok(())
    }

    /// Insert a stat, rejecting duplicates for the same date and habit
    fn record_stat(
        &self,
        date: &StatDate,
        habit_id: &HabitId,
        status: bool,
    ) -> Result<DailyStat, StorageError> {
        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO stats (date, habit_id, status) VALUES (?1, ?2, ?3) RETURNING {}",
            STAT_COLUMNS
        );

        let stat = conn
            .query_row(
                &sql,
                params![date.as_str(), habit_id.as_str(), status_to_int(status)],
                stat_from_row,
            )
            .map_err(|e| stat_write_error(e, date, habit_id))?;

        tracing::debug!("Recorded stat {} for habit {} on {}: {}", stat.id, habit_id, date, status);
        Ok(stat)
    }

    fn set_stat(
        &self,
        date: &StatDate,
        habit_id: &HabitId,
        status: bool,
    ) -> Result<DailyStat, StorageError> {
        let conn = self.lock()?;
        let stat = upsert_stat(&conn, date, habit_id, status)?;

        tracing::debug!("Set stat for habit {} on {}: {}", habit_id, date, status);
        Ok(stat)
    }

    fn toggle_stat(&self, date: &StatDate, habit_id: &HabitId) -> Result<DailyStat, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<i64> = tx
            .query_row(
                "SELECT status FROM stats WHERE date = ?1 AND habit_id = ?2",
                params![date.as_str(), habit_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let current = match current {
            Some(value) => status_from_int(value)?,
            None => false,
        };

        let stat = upsert_stat(&tx, date, habit_id, !current)?;
        tx.commit()?;

        tracing::debug!("Toggled stat for habit {} on {}: {}", habit_id, date, stat.status);
        Ok(stat)
    }

    fn get_stat(
        &self,
        date: &StatDate,
        habit_id: &HabitId,
    ) -> Result<Option<DailyStat>, StorageError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM stats WHERE date = ?1 AND habit_id = ?2",
            STAT_COLUMNS
        );

        let stat = conn
            .query_row(&sql, params![date.as_str(), habit_id.as_str()], stat_from_row)
            .optional()?;

        Ok(stat)
    }

    /// All stats for one day, served by the date index
    fn list_stats_by_date(&self, date: &StatDate) -> Result<Vec<DailyStat>, StorageError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM stats WHERE date = ?1 ORDER BY habit_id ASC, id ASC",
            STAT_COLUMNS
        );

        query_stats(&conn, &sql, params![date.as_str()])
    }

    /// All stats for one habit, served by the habit index
    fn list_stats_by_habit(&self, habit_id: &HabitId) -> Result<Vec<DailyStat>, StorageError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM stats WHERE habit_id = ?1 ORDER BY date ASC, id ASC",
            STAT_COLUMNS
        );

        query_stats(&conn, &sql, params![habit_id.as_str()])
    }

    fn list_stats_in_range(
        &self,
        start: &StatDate,
        end: &StatDate,
    ) -> Result<Vec<DailyStat>, StorageError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM stats WHERE date BETWEEN ?1 AND ?2
             ORDER BY date ASC, habit_id ASC, id ASC",
            STAT_COLUMNS
        );

        query_stats(&conn, &sql, params![start.as_str(), end.as_str()])
    }

    fn snapshot(&self) -> Result<Snapshot, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

        let habits = query_habits(&tx)?;
        let sql = format!("SELECT {} FROM stats ORDER BY date ASC, habit_id ASC", STAT_COLUMNS);
        let stats = query_stats(&tx, &sql, [])?;
        tx.commit()?;

        tracing::debug!("Loaded snapshot: {} habits, {} stats", habits.len(), stats.len());
        Ok(Snapshot::from_parts(habits, stats))
    }

    /// Replace everything with the snapshot content, all or nothing
    fn restore_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM stats", [])?;
        tx.execute("DELETE FROM habits", [])?;

        for habit in &snapshot.habits {
            validate_created_at(&habit.created_at)?;
            tx.execute(
                "INSERT INTO habits (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![habit.id.as_str(), habit.name, timestamp_to_sql(&habit.created_at)],
            )
            .map_err(|e| habit_insert_error(e, &habit.id))?;
        }

        let mut stat_count = 0usize;
        for (date, day) in &snapshot.stats {
            for (habit_id, status) in day {
                tx.execute(
                    "INSERT INTO stats (date, habit_id, status) VALUES (?1, ?2, ?3)",
                    params![date.as_str(), habit_id.as_str(), status_to_int(*status)],
                )
                .map_err(|e| stat_write_error(e, date, habit_id))?;
                stat_count += 1;
            }
        }

        tx.commit()?;

        tracing::info!(
            "Restored snapshot: {} habits, {} stats",
            snapshot.habits.len(),
            stat_count
        );
        Ok(())
    }
}
