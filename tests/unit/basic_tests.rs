/// Basic unit tests to verify core functionality
use habit_store::*;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_habit_input_validation() {
        let id = HabitId::new("h1").unwrap();
        assert!(NewHabit::new(id.clone(), "Drink Water").is_ok());
        assert!(NewHabit::new(id, "   ").is_err());
        assert!(HabitId::new("x".repeat(MAX_HABIT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_stat_date_creation() {
        let date = StatDate::new("20240101").unwrap();
        assert_eq!(date.as_str(), "20240101");
        assert_eq!(StatDate::today().as_str().len(), STAT_DATE_LEN);
    }

    #[test]
    fn test_store_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let store = HabitStore::open(&StoreConfig::at(temp_file.path()));
        assert!(store.is_ok());
    }

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf());
        assert!(storage.is_ok());
    }

    #[test]
    fn test_storage_interface() {
        let storage = SqliteStorage::in_memory().expect("Failed to create storage");
        let _: &dyn HabitStorage = &storage;
    }

    #[test]
    fn test_invalid_input_is_a_constraint_violation() {
        let store = HabitStore::in_memory().unwrap();

        let err = store.create_habit(&"x".repeat(51), "Too long").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        let err = store.create_habit("h1", &"n".repeat(256)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        store.create_habit("h1", "Drink Water").unwrap();

        let err = store.record_stat("2024-01-01", "h1", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        let err = store.record_stat_value("20240101", "h1", 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        // Nothing was written by the rejected calls
        assert!(store.list_stats_by_habit("h1").unwrap().is_empty());
        assert_eq!(store.list_habits().unwrap().len(), 1);
    }
}
