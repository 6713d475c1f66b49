use crate::config::AppConfig;
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::scanner::{FileRecord, FileScanner};
use crate::storage::models::SourceFileEntry;
use crate::storage::Database;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct BackupOptions {
    /// Classify and count, but write nothing to disk or to the store.
    pub dry_run: bool,
    /// Consult the destination content catalog before copying.
    pub check_duplicates: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            check_duplicates: true,
        }
    }
}

/// Aggregate outcome of one backup run. Per-file failures land in `errors`;
/// they never abort the run.
#[derive(Debug, Default)]
pub struct BackupReport {
    pub files_copied: usize,
    pub files_skipped: usize,
    pub files_duplicated: usize,
    pub total_bytes: u64,
    pub errors: Vec<String>,
    pub cancelled: bool,
}

/// Decides per file whether to copy, skip as unchanged, or skip because the
/// content already exists on the destination, then performs the copy and
/// updates the store. Single-threaded by design: the store is not safe for
/// concurrent writers, so hosts drive the engine from one worker context.
pub struct BackupEngine {
    db: Database,
    config: AppConfig,
    scanner: FileScanner,
    cancel: Arc<AtomicBool>,
}

/// Source-side change detection, first match wins: unseen path, changed
/// hash, or mtime drift beyond the tolerance. Anything else is unchanged.
fn needs_copy(stored: Option<&SourceFileEntry>, record: &FileRecord, tolerance: f64) -> bool {
    let Some(stored) = stored else {
        return true;
    };
    if record.hash.as_deref() != Some(stored.file_hash.as_str()) {
        return true;
    }
    if (record.modified_time - stored.modified_time).abs() > tolerance {
        return true;
    }
    false
}

impl BackupEngine {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let scanner = FileScanner::new(&config);
        Self {
            db,
            config,
            scanner,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag shared with the driving context; checked between files, so
    /// cancellation takes effect at the next file boundary, never mid-copy.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn store(&self) -> &Database {
        &self.db
    }

    pub fn run(
        &self,
        source_root: &Path,
        dest_root: &Path,
        options: BackupOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<BackupReport, Error> {
        if !source_root.exists() {
            return Err(Error::NotFound(source_root.to_path_buf()));
        }
        if !source_root.is_dir() {
            return Err(Error::NotADirectory(source_root.to_path_buf()));
        }
        self.cancel.store(false, Ordering::Relaxed);

        let source_root = source_root
            .canonicalize()
            .unwrap_or_else(|_| source_root.to_path_buf());
        if !options.dry_run {
            fs::create_dir_all(dest_root)?;
        }
        let dest_root = dest_root
            .canonicalize()
            .unwrap_or_else(|_| dest_root.to_path_buf());
        let dest_key = dest_root.display().to_string();

        let session_id = self.db.create_session(
            &source_root.display().to_string(),
            &dest_key,
        )?;

        let outcome = self.run_session(&source_root, &dest_root, &dest_key, options, progress);

        let status = match &outcome {
            Ok(report) if report.cancelled => "cancelled",
            Ok(_) => "completed",
            Err(_) => "error",
        };
        if let Ok(report) = &outcome {
            self.db.finalize_session(
                session_id,
                report.files_copied as i64,
                report.files_skipped as i64,
                report.files_duplicated as i64,
                report.total_bytes as i64,
                status,
            )?;
        } else {
            // Best effort: the run itself already failed.
            let _ = self.db.finalize_session(session_id, 0, 0, 0, 0, status);
        }

        outcome
    }

    fn run_session(
        &self,
        source_root: &Path,
        dest_root: &Path,
        dest_key: &str,
        options: BackupOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<BackupReport, Error> {
        info!(
            "Backup starting: {} -> {}{}",
            source_root.display(),
            dest_root.display(),
            if options.dry_run { " (dry run)" } else { "" }
        );

        let records = self.scanner.scan_folder(source_root, true, progress)?;
        let total = records.len();
        let mut report = BackupReport::default();
        let mut resolved = 0usize;

        for record in &records {
            if self.cancel.load(Ordering::Relaxed) {
                warn!("Backup cancelled after {} of {} files", resolved, total);
                report.cancelled = true;
                break;
            }

            let path_key = record.path.display().to_string();
            let stored = self.db.get_source_entry(&path_key)?;

            if !needs_copy(stored.as_ref(), record, self.config.mtime_tolerance_secs) {
                debug!("Skipped (unchanged): {}", record.relative_path.display());
                report.files_skipped += 1;
                resolved += 1;
                progress.on_copy_progress(resolved, total);
                continue;
            }

            // Dedup check runs only for files the source-side logic already
            // marked as needing action.
            if options.check_duplicates {
                if let Some(hash) = &record.hash {
                    if self.db.destination_has_hash(dest_key, hash)? {
                        match self.db.get_destination_entry_by_hash(dest_key, hash)? {
                            Some(existing) => info!(
                                "Skipped (duplicate on destination): {} (exists as: {})",
                                record.relative_path.display(),
                                existing.file_path
                            ),
                            None => info!(
                                "Skipped (duplicate on destination): {}",
                                record.relative_path.display()
                            ),
                        }
                        report.files_duplicated += 1;
                        resolved += 1;
                        progress.on_copy_progress(resolved, total);
                        continue;
                    }
                }
            }

            match self.copy_one(record, dest_root, dest_key, options.dry_run) {
                Ok(()) => {
                    report.files_copied += 1;
                    report.total_bytes += record.size;
                }
                Err(e) => {
                    let message =
                        format!("Error copying {}: {}", record.relative_path.display(), e);
                    error!("{}", message);
                    report.errors.push(message);
                }
            }
            resolved += 1;
            progress.on_copy_progress(resolved, total);
        }

        info!(
            "Backup finished: {} copied, {} unchanged, {} duplicates, {} bytes, {} errors",
            report.files_copied,
            report.files_skipped,
            report.files_duplicated,
            report.total_bytes,
            report.errors.len()
        );
        Ok(report)
    }

    /// Copy one file to its mapped destination path and record it in the
    /// store. Any failure is reported back as this file's error; the run
    /// continues with the next file.
    fn copy_one(
        &self,
        record: &FileRecord,
        dest_root: &Path,
        dest_key: &str,
        dry_run: bool,
    ) -> Result<(), Error> {
        let dest_path: PathBuf = dest_root.join(&record.relative_path);

        if dry_run {
            info!("[dry run] Would copy: {}", record.relative_path.display());
            return Ok(());
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&record.path, &dest_path)?;

        let mtime = FileTime::from_unix_time(
            record.modified_time.trunc() as i64,
            (record.modified_time.fract() * 1e9) as u32,
        );
        if let Err(e) = filetime::set_file_mtime(&dest_path, mtime) {
            warn!(
                "Could not preserve mtime on {}: {}",
                dest_path.display(),
                e
            );
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Owner read/write, group/other read-only; failure is non-fatal.
            if let Err(e) =
                fs::set_permissions(&dest_path, fs::Permissions::from_mode(0o644))
            {
                debug!(
                    "Could not normalize permissions on {}: {}",
                    dest_path.display(),
                    e
                );
            }
        }

        if let Some(hash) = &record.hash {
            self.db.upsert_source_entry(
                &record.path.display().to_string(),
                hash,
                record.modified_time,
                record.size as i64,
            )?;
            self.db.upsert_destination_entry(
                dest_key,
                hash,
                &record.relative_path.to_string_lossy(),
                record.size as i64,
            )?;
        }

        info!("Copied: {}", record.relative_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, mtime: f64) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/src/a.txt"),
            relative_path: PathBuf::from("a.txt"),
            size: 12,
            modified_time: mtime,
            hash: Some(hash.to_string()),
        }
    }

    fn entry(hash: &str, mtime: f64) -> SourceFileEntry {
        SourceFileEntry {
            file_path: "/src/a.txt".to_string(),
            file_hash: hash.to_string(),
            modified_time: mtime,
            file_size: 12,
            last_backed_up: Some(mtime),
            created_at: mtime,
            updated_at: mtime,
        }
    }

    #[test]
    fn test_new_path_needs_copy() {
        assert!(needs_copy(None, &record("abc", 100.0), 1.0));
    }

    #[test]
    fn test_unchanged_within_tolerance_is_skipped() {
        let stored = entry("abc", 100.0);
        assert!(!needs_copy(Some(&stored), &record("abc", 100.5), 1.0));
    }

    #[test]
    fn test_changed_hash_needs_copy_even_with_same_mtime() {
        let stored = entry("abc", 100.0);
        assert!(needs_copy(Some(&stored), &record("def", 100.0), 1.0));
    }

    #[test]
    fn test_mtime_drift_beyond_tolerance_needs_copy() {
        let stored = entry("abc", 100.0);
        assert!(needs_copy(Some(&stored), &record("abc", 102.0), 1.0));
    }

    #[test]
    fn test_tolerance_is_configurable() {
        let stored = entry("abc", 100.0);
        assert!(!needs_copy(Some(&stored), &record("abc", 102.0), 5.0));
    }
}
