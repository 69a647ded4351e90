//! Progress bar utilities for CLI output
//!
//! Per-file lines (copied, skipped, failed) are printed above a progress bar
//! that suspends cleanly while they are written.

use crate::core::relocator::{FileOutcome, ProgressUpdate};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// ============================================================================
// Styles
// ============================================================================

/// Get the progress bar style for offload operations
fn progress_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

/// Get the style for completed progress bars
fn completed_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  ✓ [{bar:40.green/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━━")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

/// Console line for a single file's outcome
pub fn outcome_line(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Copied { destination, .. } => destination.display().to_string(),
        FileOutcome::Skipped { destination, .. } => {
            format!("{}: File already exists, skipping", destination.display())
        }
        FileOutcome::Planned { destination, .. } => {
            format!("{} (dry run)", destination.display())
        }
        FileOutcome::Failed { source, reason } => {
            format!("{}: Error copying file: {}", source.display(), reason)
        }
    }
}

// ============================================================================
// Offload progress tracker
// ============================================================================

/// Progress tracker for the relocation stage
pub struct OffloadProgress {
    progress_bar: ProgressBar,
    start_time: Instant,
    bytes_copied: AtomicU64,
}

impl OffloadProgress {
    /// Create a new tracker for `total_files` files.
    ///
    /// The bar starts ticking on the first update, so anything printed or
    /// prompted before relocation begins is not drawn over.
    pub fn new(total_files: u64) -> Self {
        let progress_bar = ProgressBar::new(total_files);
        progress_bar.set_style(progress_bar_style());

        Self {
            progress_bar,
            start_time: Instant::now(),
            bytes_copied: AtomicU64::new(0),
        }
    }

    /// Create a tracker that draws nothing (tests, non-interactive output)
    pub fn hidden() -> Self {
        Self {
            progress_bar: ProgressBar::hidden(),
            start_time: Instant::now(),
            bytes_copied: AtomicU64::new(0),
        }
    }

    /// Record a finished file and print its line above the bar
    pub fn handle(&self, update: &ProgressUpdate) {
        if self.progress_bar.length() != Some(update.total_files as u64) {
            self.progress_bar.set_length(update.total_files as u64);
            self.progress_bar
                .enable_steady_tick(Duration::from_millis(100));
        }

        if let FileOutcome::Copied { bytes, .. } = &update.outcome {
            self.bytes_copied.fetch_add(*bytes, Ordering::Relaxed);
        }

        let line = outcome_line(&update.outcome);
        self.progress_bar.suspend(|| {
            if update.outcome.is_failure() {
                print_error(&line);
            } else {
                println!("  {}", line);
            }
        });

        self.progress_bar.set_position(update.current_index as u64);
        self.update_message();
    }

    /// Bytes copied so far
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied.load(Ordering::Relaxed)
    }

    /// Update the progress message
    fn update_message(&self) {
        let bytes = self.bytes_copied();
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            bytes as f64 / elapsed / 1024.0 / 1024.0
        } else {
            0.0
        };

        self.progress_bar.set_message(format!("{:.1} MB/s", rate));
    }

    /// Finish the progress display
    pub fn finish(&self) {
        self.progress_bar.set_style(completed_style());
        self.progress_bar.finish_with_message(format!(
            "Complete ({} in {})",
            format_bytes(self.bytes_copied()),
            format_duration(self.start_time.elapsed())
        ));
    }

    /// Finish with an error
    pub fn finish_with_error(&self, msg: &str) {
        self.progress_bar.abandon_with_message(format!("✗ {}", msg));
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

// ============================================================================
// Tests
// ============================================================================
