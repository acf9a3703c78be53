/// Database migration management
///
/// This module handles creating and updating the SQLite database schema.
/// It ensures the database has all the required tables, constraints and
/// indexes.

use rusqlite::{Connection, OptionalExtension};
use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// This creates all required tables and indexes if they don't exist.
/// It also sets up the version tracking for future migrations. Pending
/// migrations are applied in a single transaction.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    // Create version tracking table first
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version > CURRENT_VERSION {
        return Err(StorageError::Migration(format!(
            "Database schema version {} is newer than supported version {}",
            current_version, CURRENT_VERSION
        )));
    }

    if current_version < CURRENT_VERSION {
        let tx = conn.unchecked_transaction()?;
        run_migrations(&tx, current_version)?;
        set_version(&tx, CURRENT_VERSION)?;
        tx.commit()?;
    }

    Ok(())
}

/// Get the current database schema version
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .optional()?
        .unwrap_or(0); // A fresh database has no version record yet

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: Create initial tables
///
/// Timestamps default to the insertion time, stored as RFC 3339 text in UTC
/// padded to nine fraction digits.
/// Deleting a habit cascades to its stats; `PRAGMA foreign_keys` must be on
/// for the connection, which `SqliteStorage` takes care of.
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS habits (
            id TEXT PRIMARY KEY CHECK (length(id) BETWEEN 1 AND 50),
            name TEXT NOT NULL COLLATE NOCASE CHECK (length(name) <= 255),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000000Z', 'now'))
        );

        CREATE TABLE IF NOT EXISTS stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL CHECK (length(date) = 8),
            habit_id TEXT NOT NULL CHECK (length(habit_id) <= 50),
            status INTEGER NOT NULL CHECK (status IN (0, 1)),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000000Z', 'now')),
            CONSTRAINT unique_date_habit UNIQUE (date, habit_id),
            CONSTRAINT fk_stats_habit FOREIGN KEY (habit_id)
                REFERENCES habits (id) ON DELETE CASCADE
        );",
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created habits and stats tables");
    Ok(())
}

/// Create database indexes for version 1
fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // All habit statuses for a given day
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_stats_date ON stats (date)",
        [],
    )?;

    // All recorded statuses for a given habit (also backs the cascade)
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_stats_habit_id ON stats (habit_id)",
        [],
    )?;

    tracing::debug!("Created database indexes for v1");
    Ok(())
}
