/// Domain module containing the core data types of the habit store
/// 
/// This module defines the two persisted entities (Habit and DailyStat), the
/// identifier types they are keyed by, and the field validation rules that
/// apply before anything reaches the database.

pub mod habit;
pub mod stat;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use stat::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur while validating domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid habit id: {0}")]
    InvalidHabitId(String),
    
    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),
    
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    
    #[error("Invalid status value {0}: must be 0 or 1")]
    InvalidStatus(i64),
}
