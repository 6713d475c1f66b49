use safekeep_core::storage::Database;
use safekeep_core::{
    hasher, AppConfig, BackupEngine, BackupOptions, DestinationIndexer, ProgressReporter,
    SilentReporter,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn engine_with_memory_store() -> BackupEngine {
    let db = Database::open_in_memory().unwrap();
    BackupEngine::new(db, AppConfig::default())
}

fn setup_source(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

#[test]
fn test_dry_run_counts_without_touching_anything() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("test.txt", "test content")]);

    let engine = engine_with_memory_store();
    let options = BackupOptions {
        dry_run: true,
        check_duplicates: true,
    };
    let report = engine.run(&source, &dest, options, &SilentReporter).unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(report.files_skipped, 0);
    assert!(!dest.exists(), "dry run must not create the destination");
    assert!(engine.store().list_source_entries().unwrap().is_empty());
}

#[test]
fn test_backup_copies_new_file_and_records_it() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("test.txt", "test content")]);

    let engine = engine_with_memory_store();
    let report = engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(report.total_bytes, "test content".len() as u64);
    assert!(report.errors.is_empty());

    let copied = dest.join("test.txt");
    assert_eq!(fs::read_to_string(&copied).unwrap(), "test content");

    let entries = engine.store().list_source_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_hash, hasher::hash_str("test content"));

    // The fresh copy is also recorded in the destination catalog.
    let dest_key = dest.canonicalize().unwrap().display().to_string();
    assert!(engine
        .store()
        .destination_has_hash(&dest_key, &entries[0].file_hash)
        .unwrap());
}

#[test]
fn test_second_run_skips_unchanged_files() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(
        &source,
        &[("a.txt", "alpha"), ("docs/b.txt", "beta")],
    );

    let engine = engine_with_memory_store();
    let first = engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();
    assert_eq!(first.files_copied, 2);

    let second = engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.files_skipped, 2);
    assert_eq!(second.total_bytes, 0);
}

#[test]
fn test_changed_content_is_copied_again() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("a.txt", "version one")]);

    let engine = engine_with_memory_store();
    engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();

    fs::write(source.join("a.txt"), "version two!").unwrap();
    let report = engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(
        fs::read_to_string(dest.join("a.txt")).unwrap(),
        "version two!"
    );
    let entries = engine.store().list_source_entries().unwrap();
    assert_eq!(entries[0].file_hash, hasher::hash_str("version two!"));
}

#[test]
fn test_duplicate_content_on_destination_is_not_copied() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("dup.txt", "shared bytes")]);
    // Same content already on the destination under a different name.
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("old-name.bin"), "shared bytes").unwrap();

    let config = AppConfig::default();
    let db = Database::open_in_memory().unwrap();
    let indexed = DestinationIndexer::new(&db, &config)
        .index(&dest, true, false, &SilentReporter)
        .unwrap();
    assert_eq!(indexed.files_found, 1);

    let engine = BackupEngine::new(db, config);
    let report = engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();

    assert_eq!(report.files_duplicated, 1);
    assert_eq!(report.files_copied, 0);
    assert!(!dest.join("dup.txt").exists());
    // Source history is only written for files actually copied.
    assert!(engine.store().list_source_entries().unwrap().is_empty());
}

#[test]
fn test_duplicate_check_can_be_disabled() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("dup.txt", "shared bytes")]);
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("old-name.bin"), "shared bytes").unwrap();

    let config = AppConfig::default();
    let db = Database::open_in_memory().unwrap();
    DestinationIndexer::new(&db, &config)
        .index(&dest, true, false, &SilentReporter)
        .unwrap();

    let engine = BackupEngine::new(db, config);
    let options = BackupOptions {
        dry_run: false,
        check_duplicates: false,
    };
    let report = engine.run(&source, &dest, options, &SilentReporter).unwrap();

    assert_eq!(report.files_duplicated, 0);
    assert_eq!(report.files_copied, 1);
    assert!(dest.join("dup.txt").exists());
}

#[test]
fn test_destination_index_uses_freshness_cache() {
    let tmp = tempdir().unwrap();
    let dest = tmp.path().join("dest");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("a.txt"), "indexed once").unwrap();

    let config = AppConfig::default();
    let db = Database::open_in_memory().unwrap();
    let indexer = DestinationIndexer::new(&db, &config);

    let first = indexer.index(&dest, false, false, &SilentReporter).unwrap();
    assert!(!first.cached);
    assert_eq!(first.files_found, 1);

    // New file appears, but without a forced rescan the cache answers.
    fs::write(dest.join("b.txt"), "added later").unwrap();
    let second = indexer.index(&dest, false, false, &SilentReporter).unwrap();
    assert!(second.cached);
    assert_eq!(second.files_found, 1);

    let third = indexer.index(&dest, true, false, &SilentReporter).unwrap();
    assert!(!third.cached);
    assert_eq!(third.files_found, 2);
}

#[test]
fn test_index_counts_distinct_hashes() {
    let tmp = tempdir().unwrap();
    let dest = tmp.path().join("dest");
    fs::create_dir_all(dest.join("sub")).unwrap();
    fs::write(dest.join("a.txt"), "same bytes").unwrap();
    fs::write(dest.join("sub").join("b.txt"), "same bytes").unwrap();
    fs::write(dest.join("c.txt"), "other bytes").unwrap();

    let config = AppConfig::default();
    let db = Database::open_in_memory().unwrap();
    let result = DestinationIndexer::new(&db, &config)
        .index(&dest, true, false, &SilentReporter)
        .unwrap();

    assert_eq!(result.files_found, 3);
    assert_eq!(result.hashes_indexed, 2);
}

#[test]
fn test_copy_failure_is_isolated_per_file() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("blocked.txt", "cannot land"), ("fine.txt", "lands")]);
    // A directory squatting on the mapped path makes this one copy fail.
    fs::create_dir_all(dest.join("blocked.txt")).unwrap();

    let engine = engine_with_memory_store();
    let report = engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("blocked.txt"));
    assert_eq!(fs::read_to_string(dest.join("fine.txt")).unwrap(), "lands");

    let sessions = engine.store().list_sessions(10).unwrap();
    assert_eq!(sessions[0].status, "completed");
}

struct CancelDuringScan {
    cancel: Arc<AtomicBool>,
}

impl ProgressReporter for CancelDuringScan {
    fn on_scan_progress(&self, _current: usize, _total: usize) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

#[test]
fn test_cancellation_takes_effect_at_file_boundary() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("a.txt", "one"), ("b.txt", "two")]);

    let engine = engine_with_memory_store();
    let reporter = CancelDuringScan {
        cancel: engine.cancel_token(),
    };
    let report = engine
        .run(&source, &dest, BackupOptions::default(), &reporter)
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.files_copied, 0);
    assert!(!dest.join("a.txt").exists());

    let sessions = engine.store().list_sessions(10).unwrap();
    assert_eq!(sessions[0].status, "cancelled");
}

#[test]
fn test_backup_preserves_modification_time() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    setup_source(&source, &[("a.txt", "timed")]);

    let old = filetime::FileTime::from_unix_time(1_500_000_000, 0);
    filetime::set_file_mtime(source.join("a.txt"), old).unwrap();

    let engine = engine_with_memory_store();
    engine
        .run(&source, &dest, BackupOptions::default(), &SilentReporter)
        .unwrap();

    let copied_mtime = fs::metadata(dest.join("a.txt"))
        .unwrap()
        .modified()
        .unwrap();
    let copied = filetime::FileTime::from_system_time(copied_mtime);
    assert_eq!(copied.unix_seconds(), 1_500_000_000);
}

#[test]
fn test_missing_source_root_is_fatal() {
    let tmp = tempdir().unwrap();
    let missing: PathBuf = tmp.path().join("nope");
    let dest = tmp.path().join("dest");

    let engine = engine_with_memory_store();
    let result = engine.run(&missing, &dest, BackupOptions::default(), &SilentReporter);
    assert!(matches!(result, Err(safekeep_core::Error::NotFound(_))));
    // No session is opened for an invalid root.
    assert!(engine.store().list_sessions(10).unwrap().is_empty());
}
