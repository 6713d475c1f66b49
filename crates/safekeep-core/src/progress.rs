/// Trait for reporting scan and backup progress.
///
/// The CLI implements this with indicatif bars; embedders wire it to their
/// own event loop. All methods have default no-op implementations.
///
/// `current`/`total` pairs are monotonically increasing within one phase and
/// are emitted after each file is accounted for.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_progress(&self, _current: usize, _total: usize) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_copy_progress(&self, _current: usize, _total: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
