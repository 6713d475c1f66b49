mod filter;

pub use filter::ScanFilter;

use crate::config::AppConfig;
use crate::error::Error;
use crate::hasher;
use crate::platform;
use crate::progress::ProgressReporter;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Metadata for one file produced by a scan. Transient; persistence
/// decisions are made downstream by the engine and indexer.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the scan root; falls back to the absolute path when
    /// the file resolves outside the root (e.g. through a symlink).
    pub relative_path: PathBuf,
    pub size: u64,
    /// Modification time as fractional UNIX seconds.
    pub modified_time: f64,
    /// Hex content digest; `None` when hashing was not requested.
    pub hash: Option<String>,
}

/// Walks a directory tree and produces `FileRecord`s, applying directory
/// pruning, glob filtering, and size bounds from the configuration.
pub struct FileScanner {
    filter: ScanFilter,
}

fn modified_time_of(metadata: &Metadata) -> f64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Directories pruned during traversal: hidden names and platform system
/// directories. Never applied to the scan root itself.
fn should_skip_directory(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    platform::is_hidden_entry(&name)
        || platform::system_excluded_dir_names().contains(&name.as_ref())
}

impl FileScanner {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            filter: ScanFilter::from_config(config),
        }
    }

    /// Scan every file under `root`, optionally computing content hashes.
    ///
    /// Two passes: the first collects the filtered file set so progress has
    /// a stable denominator, the second stats and hashes. Files that cannot
    /// be read are dropped so a partial tree still yields a usable result.
    pub fn scan_folder(
        &self,
        root: &Path,
        compute_hash: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<FileRecord>, Error> {
        if !root.exists() {
            return Err(Error::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        let start = std::time::Instant::now();
        let candidates = self.collect_candidates(&root);
        let total = candidates.len();
        debug!("Scan of {} matched {} files", root.display(), total);

        let mut records = Vec::with_capacity(total);
        for (path, metadata) in candidates {
            let hash = if compute_hash {
                match hasher::hash_file(&path) {
                    Ok(digest) => Some(digest),
                    Err(e) => {
                        // Unreadable or vanished since listing; drop it.
                        warn!("Skipping unreadable file {}: {}", path.display(), e);
                        continue;
                    }
                }
            } else {
                None
            };

            let relative_path = path
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());

            records.push(FileRecord {
                relative_path,
                size: metadata.len(),
                modified_time: modified_time_of(&metadata),
                hash,
                path,
            });
            progress.on_scan_progress(records.len(), total);
        }
        progress.on_scan_complete(records.len(), start.elapsed().as_secs_f64());

        Ok(records)
    }

    /// Same filtering/stat/hash logic for a single path. Returns `None` if
    /// the path is missing, not a file, filtered out, or unreadable.
    pub fn file_record(&self, path: &Path, compute_hash: bool) -> Option<FileRecord> {
        if !path.is_file() || !self.filter.accepts_name(path) {
            return None;
        }
        let metadata = std::fs::metadata(path).ok()?;
        if !self.filter.accepts_size(metadata.len()) {
            return None;
        }

        let hash = if compute_hash {
            Some(hasher::hash_file(path).ok()?)
        } else {
            None
        };

        Some(FileRecord {
            path: path.to_path_buf(),
            relative_path: path.to_path_buf(),
            size: metadata.len(),
            modified_time: modified_time_of(&metadata),
            hash,
        })
    }

    /// First pass: walk the tree, prune excluded directories, and keep the
    /// files that pass the name and size filters.
    fn collect_candidates(&self, root: &Path) -> Vec<(PathBuf, Metadata)> {
        let mut candidates = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !should_skip_directory(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !self.filter.accepts_name(path) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !self.filter.accepts_size(metadata.len()) {
                continue;
            }
            candidates.push((path.to_path_buf(), metadata));
        }

        candidates
    }
}
