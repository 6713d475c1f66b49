/// Last-known identity of a source file, keyed by absolute path.
/// Created on the first successful copy of a path, updated on every
/// subsequent one; `created_at` is preserved across upserts.
#[derive(Debug, Clone)]
pub struct SourceFileEntry {
    pub file_path: String,
    pub file_hash: String,
    pub modified_time: f64,
    pub file_size: i64,
    pub last_backed_up: Option<f64>,
    pub created_at: f64,
    pub updated_at: f64,
}

/// One known content location on a destination. Multiple entries may share
/// a hash under the same root; that is what enables dedup by content.
#[derive(Debug, Clone)]
pub struct DestinationEntry {
    pub dest_root: String,
    pub file_hash: String,
    pub file_path: String,
    pub file_size: i64,
    pub last_seen: f64,
    pub created_at: f64,
}

/// Freshness record for a destination index pass. Advisory only: a forced
/// re-index always wins.
#[derive(Debug, Clone)]
pub struct DestinationScanInfo {
    pub dest_root: String,
    pub last_scan_time: f64,
    pub files_count: i64,
    pub scan_duration: f64,
}

/// One invocation of the backup engine. Append-only; never mutated after
/// reaching a terminal status.
#[derive(Debug, Clone)]
pub struct BackupSession {
    pub id: i64,
    pub session_start: f64,
    pub session_end: Option<f64>,
    pub source_path: String,
    pub dest_path: String,
    pub files_copied: i64,
    pub files_skipped: i64,
    pub files_duplicated: i64,
    pub total_bytes: i64,
    pub status: String,
}
