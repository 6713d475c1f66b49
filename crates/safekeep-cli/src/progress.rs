use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use safekeep_core::ProgressReporter;
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// Scan and copy phases each get a bar whose length is set on the first
/// progress event, since the engine computes totals before processing.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    copy_label: &'static str,
}

impl CliReporter {
    pub fn new(copy_label: &'static str) -> Self {
        Self {
            bar: Mutex::new(None),
            copy_label,
        }
    }

    fn update_bar(&self, label: &str, current: usize, total: usize) {
        let mut guard = self.bar.lock().unwrap();
        let pb = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len} files",
                )
                .unwrap()
                .progress_chars("━╸─")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            pb.enable_steady_tick(std::time::Duration::from_millis(80));
            pb
        });
        if pb.length() != Some(total as u64) {
            pb.set_length(total as u64);
        }
        pb.set_message(label.to_string());
        pb.set_position(current as u64);
        if current >= total {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_progress(&self, current: usize, total: usize) {
        self.update_bar("Scanning", current, total);
    }

    fn on_scan_complete(&self, total_files: usize, duration_secs: f64) {
        eprintln!(
            "  {} Scan complete: {} files in {:.2}s",
            "✓".green(),
            total_files,
            duration_secs
        );
    }

    fn on_copy_progress(&self, current: usize, total: usize) {
        self.update_bar(self.copy_label, current, total);
    }
}
