/// Basic integration tests
use habit_store::*;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[test]
    fn test_drink_water_scenario() {
        let store = HabitStore::in_memory().expect("Failed to create store");

        let habit = store.create_habit("h1", "Drink Water").unwrap();
        assert_eq!(habit.id.as_str(), "h1");
        assert_eq!(habit.name, "Drink Water");

        let stat = store.record_stat("20240101", "h1", true).unwrap();
        assert!(stat.status);
        assert_eq!(stat.date.as_str(), "20240101");

        let err = store.record_stat("20240101", "h1", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        store.delete_habit("h1").unwrap();
        assert!(store.list_stats_by_habit("h1").unwrap().is_empty());

        let err = store.record_stat("20240101", "h1", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
    }

    #[test]
    fn test_create_habit_twice() {
        let store = HabitStore::in_memory().unwrap();
        store.create_habit("h1", "Drink Water").unwrap();

        let err = store.create_habit("h1", "Drink Water").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_create_habit_at_out_of_range() {
        use chrono::TimeZone;

        let store = HabitStore::in_memory().unwrap();
        let far_future = chrono::Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();

        let err = store.create_habit_at("h1", "Drink Water", far_future).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        // The store is still readable and the id is still free
        assert!(store.list_habits().unwrap().is_empty());
        assert!(store.snapshot().unwrap().habits.is_empty());
        assert_eq!(store.get_habit("h1").unwrap_err().kind(), ErrorKind::NotFound);

        let ts = chrono::Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        let habit = store.create_habit_at("h1", "Drink Water", ts).unwrap();
        assert_eq!(store.get_habit("h1").unwrap(), habit);
    }

    #[test]
    fn test_delete_unknown_habit() {
        let store = HabitStore::in_memory().unwrap();
        let err = store.delete_habit("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_lookup_with_unstorable_id() {
        let store = HabitStore::in_memory().unwrap();
        store.create_habit("h1", "Drink Water").unwrap();
        store.record_stat("20240101", "h1", true).unwrap();

        let too_long = "x".repeat(MAX_HABIT_ID_LEN + 1);
        for id in ["", too_long.as_str()] {
            assert_eq!(store.get_habit(id).unwrap_err().kind(), ErrorKind::NotFound);
            assert_eq!(store.delete_habit(id).unwrap_err().kind(), ErrorKind::NotFound);
            assert!(store.list_stats_by_habit(id).unwrap().is_empty());
            assert!(store.get_stat("20240101", id).unwrap().is_none());
        }

        // Writes still reject the id outright
        let err = store.record_stat("20240101", &too_long, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        assert_eq!(store.list_habits().unwrap().len(), 1);
    }

    #[test]
    fn test_date_and_habit_buckets_agree() {
        let store = HabitStore::in_memory().unwrap();
        let habits = ["h1", "h2", "h3"];
        let dates = ["20240103", "20240101", "20240102"];

        for habit in habits {
            store.create_habit(habit, habit).unwrap();
        }
        // Insert in a scrambled order; skip one pair so buckets differ in size
        for (i, date) in dates.iter().enumerate() {
            for habit in habits.iter().rev() {
                if *habit == "h2" && i == 0 {
                    continue;
                }
                store.record_stat(date, habit, i % 2 == 0).unwrap();
            }
        }

        let mut from_dates: Vec<i64> = dates
            .iter()
            .flat_map(|d| store.list_stats_by_date(d).unwrap())
            .map(|s| s.id)
            .collect();
        let mut from_habits: Vec<i64> = habits
            .iter()
            .flat_map(|h| store.list_stats_by_habit(h).unwrap())
            .map(|s| s.id)
            .collect();

        from_dates.sort_unstable();
        from_habits.sort_unstable();
        assert_eq!(from_dates.len(), 8);
        assert_eq!(from_dates, from_habits);

        for date in dates {
            for stat in store.list_stats_by_date(date).unwrap() {
                assert_eq!(stat.date.as_str(), date);
            }
        }
    }

    #[test]
    fn test_upsert_and_toggle() {
        let store = HabitStore::in_memory().unwrap();
        store.create_habit("h1", "Drink Water").unwrap();

        let recorded = store.record_stat("20240101", "h1", false).unwrap();
        let updated = store.set_stat("20240101", "h1", true).unwrap();
        assert_eq!(recorded.id, updated.id);
        assert!(updated.status);

        let toggled = store.toggle_stat("20240101", "h1").unwrap();
        assert!(!toggled.status);

        let fresh = store.toggle_stat("20240102", "h1").unwrap();
        assert!(fresh.status);

        assert_eq!(store.list_stats_by_habit("h1").unwrap().len(), 2);
    }

    #[test]
    fn test_database_persistence() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let config = StoreConfig::at(temp_file.path());

        {
            let store = HabitStore::open(&config).expect("Failed to create first store");
            store.create_habit("h1", "Drink Water").unwrap();
            store.record_stat("20240101", "h1", true).unwrap();
        }

        let store = HabitStore::open(&config).expect("Failed to reopen store");
        assert_eq!(store.get_habit("h1").unwrap().name, "Drink Water");
        let stat = store.get_stat("20240101", "h1").unwrap();
        assert!(stat.map(|s| s.status).unwrap_or(false));
    }

    #[test]
    fn test_snapshot_json_restore() {
        let source = HabitStore::in_memory().unwrap();
        source.create_habit("h1", "Drink Water").unwrap();
        source.create_habit("h2", "Read").unwrap();
        source.record_stat("20240101", "h1", true).unwrap();
        source.record_stat("20240102", "h2", true).unwrap();

        let json = source.snapshot().unwrap().to_json().unwrap();
        let snapshot = Snapshot::from_json(&json).unwrap();

        let target = HabitStore::in_memory().unwrap();
        target.restore_snapshot(&snapshot).unwrap();

        assert_eq!(target.list_habits().unwrap(), source.list_habits().unwrap());
        assert_eq!(target.list_stats_by_date("20240101").unwrap().len(), 1);
        assert_eq!(target.list_stats_in_range("20240101", "20240131").unwrap().len(), 2);
    }
}
