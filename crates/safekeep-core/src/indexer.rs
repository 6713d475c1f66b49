use crate::config::AppConfig;
use crate::error::Error;
use crate::platform;
use crate::progress::ProgressReporter;
use crate::scanner::FileScanner;
use crate::storage::Database;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Outcome of one destination index pass.
#[derive(Debug)]
pub struct IndexResult {
    pub files_found: usize,
    pub hashes_indexed: usize,
    pub duration_seconds: f64,
    /// True when the result came from the freshness cache and no filesystem
    /// work was done.
    pub cached: bool,
}

/// Builds the destination content catalog by pointing the tree scanner at a
/// destination root (or its enclosing volume) and recording every hash.
///
/// The index is a cache with explicit invalidation: staleness is the
/// caller's responsibility via `force_rescan`.
pub struct DestinationIndexer<'a> {
    db: &'a Database,
    scanner: FileScanner,
}

impl<'a> DestinationIndexer<'a> {
    pub fn new(db: &'a Database, config: &AppConfig) -> Self {
        Self {
            db,
            scanner: FileScanner::new(config),
        }
    }

    pub fn index(
        &self,
        dest_root: &Path,
        force_rescan: bool,
        expand_to_volume: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<IndexResult, Error> {
        if !dest_root.exists() {
            return Err(Error::NotFound(dest_root.to_path_buf()));
        }
        let mut root = dest_root
            .canonicalize()
            .unwrap_or_else(|_| dest_root.to_path_buf());

        if expand_to_volume {
            let volume_root = platform::volume_root_of(&root);
            if volume_root != root {
                info!(
                    "Indexing entire volume {} (destination folder: {})",
                    volume_root.display(),
                    root.display()
                );
                root = volume_root;
            }
        }
        let root_key = root.display().to_string();

        if !force_rescan {
            if let Some(scan_info) = self.db.get_destination_scan_info(&root_key)? {
                let age = chrono::Utc::now().timestamp() as f64 - scan_info.last_scan_time;
                info!(
                    "Destination {} indexed {:.0}s ago ({} files); pass force_rescan to rebuild",
                    root_key, age, scan_info.files_count
                );
                return Ok(IndexResult {
                    files_found: scan_info.files_count as usize,
                    hashes_indexed: scan_info.files_count as usize,
                    duration_seconds: scan_info.scan_duration,
                    cached: true,
                });
            }
        }

        info!("Indexing destination {}", root_key);
        let start = Instant::now();

        // Wholesale rebuild; incremental diffing of the destination would
        // risk stale-entry drift.
        self.db.clear_destination_entries(&root_key)?;

        let records = self.scanner.scan_folder(&root, true, progress)?;

        let mut distinct_hashes: HashSet<String> = HashSet::new();
        let mut files_indexed = 0usize;
        for record in &records {
            if let Some(hash) = &record.hash {
                self.db.upsert_destination_entry(
                    &root_key,
                    hash,
                    &record.relative_path.to_string_lossy(),
                    record.size as i64,
                )?;
                distinct_hashes.insert(hash.clone());
                files_indexed += 1;
            }
        }

        let duration_seconds = start.elapsed().as_secs_f64();
        self.db
            .record_destination_scan(&root_key, files_indexed as i64, duration_seconds)?;

        info!(
            "Destination index complete: {} files, {} unique hashes, {:.2}s",
            files_indexed,
            distinct_hashes.len(),
            duration_seconds
        );

        Ok(IndexResult {
            files_found: files_indexed,
            hashes_indexed: distinct_hashes.len(),
            duration_seconds,
            cached: false,
        })
    }
}
