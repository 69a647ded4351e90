//! File relocation into the dated destination tree
//!
//! Each media file is copied to
//! `<destination>/<YYYY-MM-DD>/[<device>/]<HHMMSS>_<original name>`, using the
//! file's creation time in local time. The path is a pure function of the
//! inputs, so re-running over the same card finds every file already in place
//! and skips it.
//!
//! Every file gets exactly one attempt. Whatever goes wrong with one file is
//! recorded in its [`FileOutcome`] and the batch moves on.
//!
//! # Example
//!
//! ```rust,no_run
//! use camera_offload::core::relocator::{RelocationConfig, Relocator};
//! use std::path::PathBuf;
//!
//! let config = RelocationConfig::new("/srv/footage", "HERO9 Black");
//! let relocator = Relocator::new(config);
//! let report = relocator.relocate(&[PathBuf::from("/media/card/DCIM/100GOPRO/GOPR0001.JPG")]);
//! println!("{}", report);
//! ```

use crate::core::error::{OffloadError, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use log::{debug, info, trace, warn};
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a relocation batch
pub struct RelocationConfig {
    /// Root of the destination tree
    pub destination_root: PathBuf,
    /// Device folder name; empty to leave it out
    pub device_label: String,
    /// Report destinations without creating directories or copying
    pub dry_run: bool,
    /// Callback invoked after each file is handled
    pub progress_callback: Option<Arc<dyn Fn(ProgressUpdate) + Send + Sync>>,
}

impl std::fmt::Debug for RelocationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelocationConfig")
            .field("destination_root", &self.destination_root)
            .field("device_label", &self.device_label)
            .field("dry_run", &self.dry_run)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Clone for RelocationConfig {
    fn clone(&self) -> Self {
        Self {
            destination_root: self.destination_root.clone(),
            device_label: self.device_label.clone(),
            dry_run: self.dry_run,
            progress_callback: self.progress_callback.clone(),
        }
    }
}

impl RelocationConfig {
    /// Create a config for the given destination root and device label
    pub fn new<P: AsRef<Path>>(destination_root: P, device_label: &str) -> Self {
        Self {
            destination_root: destination_root.as_ref().to_path_buf(),
            device_label: device_label.to_string(),
            dry_run: false,
            progress_callback: None,
        }
    }

    /// Set dry-run mode
    pub fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// What happened to a single source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Copied to `destination`
    Copied {
        source: PathBuf,
        destination: PathBuf,
        bytes: u64,
    },
    /// A file already existed at `destination`
    Skipped {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Dry run: would have been copied to `destination`
    Planned {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Could not be relocated
    Failed { source: PathBuf, reason: String },
}

impl FileOutcome {
    /// Source file this outcome is about
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Copied { source, .. }
            | FileOutcome::Skipped { source, .. }
            | FileOutcome::Planned { source, .. }
            | FileOutcome::Failed { source, .. } => source,
        }
    }

    /// Computed destination, if the file got that far
    pub fn destination(&self) -> Option<&Path> {
        match self {
            FileOutcome::Copied { destination, .. }
            | FileOutcome::Skipped { destination, .. }
            | FileOutcome::Planned { destination, .. } => Some(destination),
            FileOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

/// Progress update sent after each file
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current file index (1-based)
    pub current_index: usize,
    /// Total number of files in the batch
    pub total_files: usize,
    /// Result for the current file
    pub outcome: FileOutcome,
}

// =============================================================================
// Batch report
// =============================================================================

/// Per-file results for one relocation batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One outcome per attempted file, in input order
    pub outcomes: Vec<FileOutcome>,
    /// Files handed to the batch
    pub files_found: usize,
    /// Files never attempted because the run was interrupted
    pub not_attempted: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn copied(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Copied { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Planned { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(FileOutcome::is_failure)
    }

    /// Total bytes written to the destination
    pub fn bytes_copied(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                FileOutcome::Copied { bytes, .. } => *bytes,
                _ => 0,
            })
            .sum()
    }

    /// Failed outcomes only
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// Whether the batch stopped before every file was attempted
    pub fn was_interrupted(&self) -> bool {
        self.not_attempted > 0
    }

    /// Get bytes copied in MB
    pub fn megabytes_copied(&self) -> f64 {
        self.bytes_copied() as f64 / (1024.0 * 1024.0)
    }

    fn count<F: Fn(&FileOutcome) -> bool>(&self, pred: F) -> usize {
        self.outcomes.iter().filter(|&o| pred(o)).count()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Copied: {}, Skipped: {}, Errors: {}, Size: {:.2} MB, Duration: {:.2}s",
            self.copied(),
            self.skipped(),
            self.failed(),
            self.megabytes_copied(),
            self.duration_ms as f64 / 1000.0
        )?;
        if self.planned() > 0 {
            write!(f, ", Planned: {}", self.planned())?;
        }
        if self.not_attempted > 0 {
            write!(f, ", Not attempted: {}", self.not_attempted)?;
        }
        Ok(())
    }
}

// =============================================================================
// Path computation
// =============================================================================

/// Destination for a file created at `created` named `file_name`.
///
/// `<root>/<YYYY-MM-DD>/[<label>/]<HHMMSS>_<file_name>`; the label segment is
/// left out when `device_label` is empty.
pub fn destination_path(
    root: &Path,
    device_label: &str,
    created: &NaiveDateTime,
    file_name: &OsStr,
) -> PathBuf {
    let mut path = root.join(created.format("%Y-%m-%d").to_string());
    if !device_label.is_empty() {
        path.push(device_label);
    }

    let mut name = OsString::from(created.format("%H%M%S_").to_string());
    name.push(file_name);
    path.push(name);
    path
}

/// Creation time of `path` in local time.
///
/// Falls back to the modification time where the filesystem does not record
/// a birth time.
pub fn file_timestamp(path: &Path) -> Result<DateTime<Local>> {
    let timestamp_error = |e: io::Error| OffloadError::Timestamp {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let metadata = fs::metadata(path).map_err(timestamp_error)?;
    let time = match metadata.created() {
        Ok(time) => time,
        Err(e) if e.kind() == ErrorKind::Unsupported => {
            debug!(
                "No creation time for '{}', using modification time",
                path.display()
            );
            metadata.modified().map_err(timestamp_error)?
        }
        Err(e) => return Err(timestamp_error(e)),
    };

    Ok(DateTime::<Local>::from(time))
}

/// Copy `source` to `destination`, failing if `destination` already exists.
///
/// A partially written destination is removed when the copy fails.
pub fn copy_no_clobber(source: &Path, destination: &Path) -> Result<u64> {
    let copy_error = |e: io::Error| OffloadError::Copy {
        destination: destination.to_path_buf(),
        message: e.to_string(),
    };

    let input = File::open(source).map_err(copy_error)?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(copy_error)?;

    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    let result = io::copy(&mut reader, &mut writer).and_then(|bytes| {
        writer.flush()?;
        Ok(bytes)
    });

    match result {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(destination) {
                debug!(
                    "Failed to remove partial copy '{}': {}",
                    destination.display(),
                    cleanup
                );
            }
            Err(copy_error(e))
        }
    }
}

// =============================================================================
// Relocator
// =============================================================================

/// Copies media files into the destination tree
pub struct Relocator {
    /// Configuration
    config: RelocationConfig,
    /// Shutdown flag for stopping between files
    shutdown_flag: Arc<AtomicBool>,
}

impl Relocator {
    /// Create a new relocator with the given configuration
    pub fn new(config: RelocationConfig) -> Self {
        Self {
            config,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new relocator with a shared shutdown flag
    pub fn with_shutdown_flag(config: RelocationConfig, flag: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_flag: flag,
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Relocate every file in `files`, one attempt each
    pub fn relocate(&self, files: &[PathBuf]) -> BatchReport {
        let start_time = Instant::now();
        let total = files.len();
        let mut report = BatchReport {
            files_found: total,
            ..Default::default()
        };

        for (index, file) in files.iter().enumerate() {
            if self.is_shutdown_requested() {
                report.not_attempted = total - index;
                info!(
                    "Offload interrupted, {} files not attempted",
                    report.not_attempted
                );
                break;
            }

            let outcome = self.relocate_file(file);
            self.report_progress(ProgressUpdate {
                current_index: index + 1,
                total_files: total,
                outcome: outcome.clone(),
            });
            report.outcomes.push(outcome);
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Relocation complete: {}", report);
        report
    }

    /// Relocate a single file, turning any error into `FileOutcome::Failed`
    pub fn relocate_file(&self, source: &Path) -> FileOutcome {
        match self.try_relocate(source) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to relocate '{}': {}", source.display(), e);
                FileOutcome::Failed {
                    source: source.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Destination for `source`, based on its creation time
    pub fn destination_for(&self, source: &Path) -> Result<PathBuf> {
        let created = file_timestamp(source)?;
        let file_name = source.file_name().ok_or_else(|| {
            OffloadError::Io(format!("'{}' has no file name", source.display()))
        })?;

        Ok(destination_path(
            &self.config.destination_root,
            &self.config.device_label,
            &created.naive_local(),
            file_name,
        ))
    }

    fn try_relocate(&self, source: &Path) -> Result<FileOutcome> {
        let destination = self.destination_for(source)?;

        if destination.exists() {
            trace!("Already exists: {}", destination.display());
            return Ok(FileOutcome::Skipped {
                source: source.to_path_buf(),
                destination,
            });
        }

        if self.config.dry_run {
            return Ok(FileOutcome::Planned {
                source: source.to_path_buf(),
                destination,
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| OffloadError::DirectoryCreation {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let bytes = copy_no_clobber(source, &destination)?;
        debug!("Copied: {} ({} bytes)", destination.display(), bytes);

        Ok(FileOutcome::Copied {
            source: source.to_path_buf(),
            destination,
            bytes,
        })
    }

    /// Report progress to callback if configured
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.config.progress_callback {
            callback(update);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
