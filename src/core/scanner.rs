//! Media discovery on the card
//!
//! Cameras spread media over numbered subfolders of their storage folder
//! (`DCIM/100GOPRO`, `DCIM/101GOPRO`, ...), so the scan is recursive and
//! picks up allow-listed files at any depth.

use log::{debug, trace, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find the camera storage folder directly under `source_root`.
///
/// The name is matched case-insensitively; an exact match is preferred.
pub fn find_storage_dir(source_root: &Path, name: &str) -> Option<PathBuf> {
    let exact = source_root.join(name);
    if exact.is_dir() {
        return Some(exact);
    }

    let entries = match fs::read_dir(source_root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list '{}': {}", source_root.display(), e);
            return None;
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .find(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|entry| entry.path())
}

/// Collects media files by extension
#[derive(Debug, Clone)]
pub struct MediaScanner {
    /// Lowercase extensions without the leading dot
    extensions: Vec<String>,
}

impl MediaScanner {
    /// Create a scanner for the given allow-list
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// The allow-list in use
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether `path` has an allow-listed extension (case-insensitive)
    pub fn is_media_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .map(|e| self.extensions.iter().any(|allowed| *allowed == e))
            .unwrap_or(false)
    }

    /// Recursively collect media files under `dir`.
    ///
    /// Unreadable entries are logged and skipped. A directory without matches
    /// yields an empty list.
    pub fn scan(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut folders = 0usize;

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under '{}': {}", dir.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                folders += 1;
                trace!("Scanning folder: {}", entry.path().display());
            } else if entry.file_type().is_file() && self.is_media_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!(
            "Scanned {} folders under '{}', found {} media files",
            folders,
            dir.display(),
            files.len()
        );
        files
    }
}
