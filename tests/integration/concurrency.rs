/// Concurrent access to a shared store
use std::sync::{Arc, Barrier};
use std::thread;

use habit_store::*;
use tempfile::NamedTempFile;

const THREADS: usize = 8;

fn race<T, F>(store: Arc<HabitStore>, op: F) -> Vec<Result<T, StorageError>>
where
    T: Send + 'static,
    F: Fn(&HabitStore, usize) -> Result<T, StorageError> + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let op = Arc::new(op);

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let op = Arc::clone(&op);
            thread::spawn(move || {
                barrier.wait();
                (*op)(&*store, i)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect()
}

#[test]
fn test_concurrent_duplicate_stat_has_one_winner() {
    let store = Arc::new(HabitStore::in_memory().unwrap());
    store.create_habit("h1", "Drink Water").unwrap();

    let results = race(Arc::clone(&store), |store, _| {
        store.record_stat("20240101", "h1", true)
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::DuplicateKey))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, THREADS - 1);
    assert_eq!(store.list_stats_by_habit("h1").unwrap().len(), 1);
}

#[test]
fn test_concurrent_duplicate_habit_across_connections() {
    // Two stores on the same file use separate connections, so uniqueness
    // has to come from the database rather than the in-process lock.
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let config = StoreConfig::at(temp_file.path());
    let first = Arc::new(HabitStore::open(&config).unwrap());
    let second = Arc::new(HabitStore::open(&config).unwrap());

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|store| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.create_habit("h1", "Drink Water")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(e) if e.kind() == ErrorKind::DuplicateKey)));
}

#[test]
fn test_delete_racing_inserts_leaves_no_orphans() {
    let store = Arc::new(HabitStore::in_memory().unwrap());
    store.create_habit("h1", "Drink Water").unwrap();

    let results = race(Arc::clone(&store), |store, i| {
        if i == 0 {
            store.delete_habit("h1")
        } else {
            let date = format!("202401{:02}", i);
            store.record_stat(&date, "h1", true).map(|_| ())
        }
    });

    assert!(results[0].is_ok());

    // Every insert either landed before the delete (and was cascaded away)
    // or came after it and was rejected.
    for (i, result) in results.iter().enumerate().skip(1) {
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::ForeignKeyViolation, "worker {}", i);
        }
    }

    assert!(store.list_stats_by_habit("h1").unwrap().is_empty());
    assert!(store.snapshot().unwrap().stats.is_empty());
}
