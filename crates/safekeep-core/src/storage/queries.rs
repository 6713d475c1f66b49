use super::models::*;
use super::sqlite::Database;
use rusqlite::{params, OptionalExtension, Result};
use tracing::debug;

/// Current wall-clock time as fractional UNIX seconds, the representation
/// used for every REAL timestamp column.
pub(crate) fn now_epoch() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl Database {
    // ── Source file entries ──────────────────────────────────────

    /// Insert or update the last-known identity of a source path.
    /// Last-writer-wins; `created_at` survives the upsert, `updated_at` and
    /// `last_backed_up` are refreshed.
    pub fn upsert_source_entry(
        &self,
        file_path: &str,
        file_hash: &str,
        modified_time: f64,
        file_size: i64,
    ) -> Result<()> {
        let now = now_epoch();
        self.connection().execute(
            "INSERT INTO source_file \
             (file_path, file_hash, modified_time, file_size, last_backed_up, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?5) \
             ON CONFLICT(file_path) DO UPDATE SET \
                 file_hash = excluded.file_hash, \
                 modified_time = excluded.modified_time, \
                 file_size = excluded.file_size, \
                 last_backed_up = excluded.last_backed_up, \
                 updated_at = excluded.updated_at",
            params![file_path, file_hash, modified_time, file_size, now],
        )?;
        Ok(())
    }

    pub fn get_source_entry(&self, file_path: &str) -> Result<Option<SourceFileEntry>> {
        self.connection()
            .query_row(
                "SELECT file_path, file_hash, modified_time, file_size, \
                        last_backed_up, created_at, updated_at \
                 FROM source_file WHERE file_path = ?1",
                params![file_path],
                |row| {
                    Ok(SourceFileEntry {
                        file_path: row.get(0)?,
                        file_hash: row.get(1)?,
                        modified_time: row.get(2)?,
                        file_size: row.get(3)?,
                        last_backed_up: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .optional()
    }

    pub fn delete_source_entry(&self, file_path: &str) -> Result<usize> {
        self.connection().execute(
            "DELETE FROM source_file WHERE file_path = ?1",
            params![file_path],
        )
    }

    pub fn list_source_entries(&self) -> Result<Vec<SourceFileEntry>> {
        let mut stmt = self.connection().prepare(
            "SELECT file_path, file_hash, modified_time, file_size, \
                    last_backed_up, created_at, updated_at \
             FROM source_file ORDER BY file_path",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(SourceFileEntry {
                    file_path: row.get(0)?,
                    file_hash: row.get(1)?,
                    modified_time: row.get(2)?,
                    file_size: row.get(3)?,
                    last_backed_up: row.get(4)?,
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    // ── Destination catalog ──────────────────────────────────────

    /// Record a content location on a destination. Idempotent on
    /// (dest_root, file_hash, file_path); refreshes `last_seen` and size.
    pub fn upsert_destination_entry(
        &self,
        dest_root: &str,
        file_hash: &str,
        file_path: &str,
        file_size: i64,
    ) -> Result<()> {
        let now = now_epoch();
        self.connection().execute(
            "INSERT INTO destination_file \
             (dest_root, file_hash, file_path, file_size, last_seen, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT(dest_root, file_hash, file_path) DO UPDATE SET \
                 last_seen = excluded.last_seen, \
                 file_size = excluded.file_size",
            params![dest_root, file_hash, file_path, file_size, now],
        )?;
        Ok(())
    }

    /// Whether any file under `dest_root` carries this content hash.
    pub fn destination_has_hash(&self, dest_root: &str, file_hash: &str) -> Result<bool> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM destination_file \
             WHERE dest_root = ?1 AND file_hash = ?2",
            params![dest_root, file_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// One arbitrary entry carrying this hash. Existence plus detail, not
    /// enumeration: callers needing every copy require a contract change.
    pub fn get_destination_entry_by_hash(
        &self,
        dest_root: &str,
        file_hash: &str,
    ) -> Result<Option<DestinationEntry>> {
        self.connection()
            .query_row(
                "SELECT dest_root, file_hash, file_path, file_size, last_seen, created_at \
                 FROM destination_file \
                 WHERE dest_root = ?1 AND file_hash = ?2 LIMIT 1",
                params![dest_root, file_hash],
                |row| {
                    Ok(DestinationEntry {
                        dest_root: row.get(0)?,
                        file_hash: row.get(1)?,
                        file_path: row.get(2)?,
                        file_size: row.get(3)?,
                        last_seen: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()
    }

    /// Wipe the catalog for one root ahead of a fresh index pass. Entries
    /// are rebuilt wholesale rather than diffed, so none go stale.
    pub fn clear_destination_entries(&self, dest_root: &str) -> Result<usize> {
        let removed = self.connection().execute(
            "DELETE FROM destination_file WHERE dest_root = ?1",
            params![dest_root],
        )?;
        debug!("Cleared {} destination entries for {}", removed, dest_root);
        Ok(removed)
    }

    // ── Destination scan freshness ───────────────────────────────

    pub fn record_destination_scan(
        &self,
        dest_root: &str,
        files_count: i64,
        scan_duration: f64,
    ) -> Result<()> {
        let now = now_epoch();
        self.connection().execute(
            "INSERT INTO destination_scan (dest_root, last_scan_time, files_count, scan_duration) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(dest_root) DO UPDATE SET \
                 last_scan_time = excluded.last_scan_time, \
                 files_count = excluded.files_count, \
                 scan_duration = excluded.scan_duration",
            params![dest_root, now, files_count, scan_duration],
        )?;
        Ok(())
    }

    pub fn get_destination_scan_info(&self, dest_root: &str) -> Result<Option<DestinationScanInfo>> {
        self.connection()
            .query_row(
                "SELECT dest_root, last_scan_time, files_count, scan_duration \
                 FROM destination_scan WHERE dest_root = ?1",
                params![dest_root],
                |row| {
                    Ok(DestinationScanInfo {
                        dest_root: row.get(0)?,
                        last_scan_time: row.get(1)?,
                        files_count: row.get(2)?,
                        scan_duration: row.get(3)?,
                    })
                },
            )
            .optional()
    }

    // ── Backup sessions ──────────────────────────────────────────

    pub fn create_session(&self, source_path: &str, dest_path: &str) -> Result<i64> {
        let now = now_epoch();
        self.connection().execute(
            "INSERT INTO backup_session (session_start, source_path, dest_path, status) \
             VALUES (?1, ?2, ?3, 'in_progress')",
            params![now, source_path, dest_path],
        )?;
        let id = self.connection().last_insert_rowid();
        debug!("Created backup session {}", id);
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn finalize_session(
        &self,
        session_id: i64,
        files_copied: i64,
        files_skipped: i64,
        files_duplicated: i64,
        total_bytes: i64,
        status: &str,
    ) -> Result<()> {
        let now = now_epoch();
        self.connection().execute(
            "UPDATE backup_session \
             SET session_end = ?1, files_copied = ?2, files_skipped = ?3, \
                 files_duplicated = ?4, total_bytes = ?5, status = ?6 \
             WHERE id = ?7",
            params![
                now,
                files_copied,
                files_skipped,
                files_duplicated,
                total_bytes,
                status,
                session_id
            ],
        )?;
        Ok(())
    }

    /// Sessions newest-first, for the history listing.
    pub fn list_sessions(&self, limit: i64) -> Result<Vec<BackupSession>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, session_start, session_end, source_path, dest_path, \
                    files_copied, files_skipped, files_duplicated, total_bytes, status \
             FROM backup_session ORDER BY id DESC LIMIT ?1",
        )?;
        let sessions = stmt
            .query_map(params![limit], |row| {
                Ok(BackupSession {
                    id: row.get(0)?,
                    session_start: row.get(1)?,
                    session_end: row.get(2)?,
                    source_path: row.get(3)?,
                    dest_path: row.get(4)?,
                    files_copied: row.get(5)?,
                    files_skipped: row.get(6)?,
                    files_duplicated: row.get(7)?,
                    total_bytes: row.get(8)?,
                    status: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(sessions)
    }
}
