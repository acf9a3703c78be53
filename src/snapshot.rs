/// Whole-store export and import
///
/// A Snapshot holds every habit plus every stat grouped by day, which is the
/// shape a calendar view consumes: `date -> habit -> done`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use crate::domain::{DailyStat, Habit, HabitId, StatDate};

/// Complete content of a habit store at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All habits, oldest first
    pub habits: Vec<Habit>,
    /// Recorded statuses grouped by day, then by habit
    pub stats: BTreeMap<StatDate, BTreeMap<HabitId, bool>>,
}

impl Snapshot {
    /// Build a snapshot from loaded habits and stats
    pub fn from_parts(habits: Vec<Habit>, stats: impl IntoIterator<Item = DailyStat>) -> Self {
        let mut by_date: BTreeMap<StatDate, BTreeMap<HabitId, bool>> = BTreeMap::new();
        for stat in stats {
            by_date
                .entry(stat.date)
                .or_default()
                .insert(stat.habit_id, stat.status);
        }

        Self {
            habits,
            stats: by_date,
        }
    }

    /// Whether a habit was done on a day; unrecorded days count as not done
    pub fn status(&self, date: &StatDate, habit_id: &HabitId) -> bool {
        self.stats
            .get(date)
            .and_then(|day| day.get(habit_id))
            .copied()
            .unwrap_or(false)
    }

    /// Number of habits completed on a day
    pub fn completed_on(&self, date: &StatDate) -> usize {
        self.stats
            .get(date)
            .map(|day| day.values().filter(|done| **done).count())
            .unwrap_or(0)
    }

    /// Total number of stat records
    pub fn stat_count(&self) -> usize {
        self.stats.values().map(BTreeMap::len).sum()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON produced by `to_json`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
