/// Store configuration
///
/// Settings can be built in code or deserialized (e.g. from a JSON file
/// owned by the embedding application).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time a writer waits on a locked database before giving up
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Name of the database file inside the resolved data directory
const DATABASE_FILE_NAME: &str = "habits.db";

/// Where the store keeps its data and how it waits on locks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    /// If not provided, a default location in the user's home directory is used
    pub database_path: Option<PathBuf>,

    /// Keep the database in memory only (nothing is persisted)
    pub in_memory: bool,

    /// How long to wait on a database locked by another process, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            in_memory: false,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// Configuration for a database file at the given path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Resolve the database file path, creating its parent directory
    pub fn resolve_database_path(&self) -> std::io::Result<PathBuf> {
        match &self.database_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Ok(path.clone())
            }
            None => default_database_path(),
        }
    }
}

/// Get the default database path with robust fallback strategy
///
/// Candidates are tried in order of preference and the first writable one
/// wins; the temporary directory is the last resort.
pub fn default_database_path() -> std::io::Result<PathBuf> {
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(".habit_store")),
        dirs::data_dir().map(|p| p.join("habit_store")),
        dirs::config_dir().map(|p| p.join("habit_store")),
        std::env::current_dir().ok().map(|p| p.join(".habit_store")),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if is_writable_dir(potential_path) {
            return Ok(potential_path.join(DATABASE_FILE_NAME));
        }
    }

    let temp_path = std::env::temp_dir().join("habit_store");
    std::fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path.join(DATABASE_FILE_NAME))
}

fn is_writable_dir(dir: &std::path::Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }

    let probe = dir.join(".test_write");
    if std::fs::write(&probe, "test").is_err() {
        return false;
    }
    let _ = std::fs::remove_file(&probe);
    true
}
