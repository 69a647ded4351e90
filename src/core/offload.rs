//! The offload pipeline
//!
//! Pre-flight checks, then scan, identify and relocate. All inputs arrive in
//! an [`OffloadPlan`] resolved once at startup; the label strategy for unknown
//! devices is injected so tests never block on a prompt.

use crate::core::config::Config;
use crate::core::error::{OffloadError, Result};
use crate::core::relocator::{BatchReport, ProgressUpdate, RelocationConfig, Relocator};
use crate::core::scanner::{find_storage_dir, MediaScanner};
use crate::device::{resolve_label, sanitize_label, DeviceIdentifier, LabelResolver};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Everything a run needs, resolved from arguments and configuration
#[derive(Debug, Clone)]
pub struct OffloadPlan {
    /// Card root
    pub source_root: PathBuf,
    /// Destination root
    pub destination_root: PathBuf,
    /// Storage folder name under the card root
    pub storage_dir: String,
    /// Media allow-list
    pub extensions: Vec<String>,
    /// Reads the device label from the card
    pub identifier: DeviceIdentifier,
    /// Use this label instead of identifying the device
    pub label_override: Option<String>,
    /// Report without writing
    pub dry_run: bool,
}

impl OffloadPlan {
    /// Build a plan from configuration for the given roots
    pub fn from_config(config: &Config, source_root: PathBuf, destination_root: PathBuf) -> Self {
        Self {
            source_root,
            destination_root,
            storage_dir: config.offload.storage_dir.clone(),
            extensions: config.scan.allowed_extensions(),
            identifier: DeviceIdentifier::from_config(&config.offload),
            label_override: None,
            dry_run: false,
        }
    }

    /// Set a fixed device label
    pub fn label_override(mut self, label: Option<String>) -> Self {
        self.label_override = label;
        self
    }

    /// Set dry-run mode
    pub fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct OffloadSummary {
    /// Storage folder that was scanned
    pub storage_path: PathBuf,
    /// Device label used in destination paths (empty = omitted);
    /// `None` when there was nothing to copy
    pub device_label: Option<String>,
    /// Per-file results
    pub report: BatchReport,
}

/// Runs the scan/identify/relocate pipeline for one card
pub struct Offloader {
    plan: OffloadPlan,
    resolver: Box<dyn LabelResolver>,
    shutdown_flag: Arc<AtomicBool>,
    progress_callback: Option<Arc<dyn Fn(ProgressUpdate) + Send + Sync>>,
}

impl Offloader {
    /// Create an offloader for `plan`, using `resolver` for unknown devices
    pub fn new(plan: OffloadPlan, resolver: Box<dyn LabelResolver>) -> Self {
        Self {
            plan,
            resolver,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            progress_callback: None,
        }
    }

    /// Share a shutdown flag with the relocation loop
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = flag;
        self
    }

    /// Set per-file progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Check the card layout; returns the storage folder to scan.
    ///
    /// Nothing is written anywhere before this succeeds.
    pub fn preflight(&self) -> Result<PathBuf> {
        let source = &self.plan.source_root;
        if !source.is_dir() {
            return Err(OffloadError::SourceNotFound(source.clone()));
        }

        find_storage_dir(source, &self.plan.storage_dir).ok_or_else(|| {
            OffloadError::StorageDirNotFound {
                source_root: source.clone(),
                name: self.plan.storage_dir.clone(),
            }
        })
    }

    /// Device label for destination paths (empty = omit the device folder)
    pub fn device_label(&self) -> String {
        match &self.plan.label_override {
            Some(label) => sanitize_label(label),
            None => {
                let detected = self.plan.identifier.identify(&self.plan.source_root);
                resolve_label(&detected, self.resolver.as_ref())
            }
        }
    }

    /// Run the whole pipeline
    pub fn run(&self) -> Result<OffloadSummary> {
        let storage_path = self.preflight()?;
        info!("Scanning {} for media files...", storage_path.display());

        let scanner = MediaScanner::new(&self.plan.extensions);
        let files = scanner.scan(&storage_path);

        if files.is_empty() {
            warn!("No media files found on card");
            return Ok(OffloadSummary {
                storage_path,
                device_label: None,
                report: BatchReport::default(),
            });
        }
        info!("Found {} media files", files.len());

        let device_label = self.device_label();
        if device_label.is_empty() {
            info!("Filing media without a camera folder");
        } else {
            info!("Filing media under camera folder '{}'", device_label);
        }

        let report = self.relocator(&device_label).relocate(&files);

        Ok(OffloadSummary {
            storage_path,
            device_label: Some(device_label),
            report,
        })
    }

    fn relocator(&self, device_label: &str) -> Relocator {
        let mut config = RelocationConfig::new(&self.plan.destination_root, device_label)
            .dry_run(self.plan.dry_run);
        config.progress_callback = self.progress_callback.clone();
        Relocator::with_shutdown_flag(config, self.shutdown_flag.clone())
    }
}

/// Convenience wrapper: offload `source` into `destination` with `config`
pub fn offload<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    source: P,
    destination: Q,
    resolver: Box<dyn LabelResolver>,
) -> Result<OffloadSummary> {
    let plan = OffloadPlan::from_config(
        config,
        source.as_ref().to_path_buf(),
        destination.as_ref().to_path_buf(),
    );
    Offloader::new(plan, resolver).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{FixedLabel, OmitDevice, UnknownLabel};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use walkdir::WalkDir;

    const VERSION_TXT: &str = "{\n  \"camera type\": \"HERO9 Black\",\n  \"firmware version\": \"HD9.01.01.72.00\",\n}\n";

    fn write_file(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// A card with three media files, one sidecar and optional metadata
    fn make_card(with_metadata: bool) -> TempDir {
        let card = TempDir::new().unwrap();
        let dcim = card.path().join("DCIM");
        write_file(&dcim.join("100GOPRO").join("GOPR0001.JPG"), b"jpg-1");
        write_file(&dcim.join("100GOPRO").join("GX010002.MP4"), b"mp4-2");
        write_file(&dcim.join("100GOPRO").join("GX010002.THM"), b"thumb");
        write_file(&dcim.join("101GOPRO").join("GOPR0003.JPG"), b"jpg-3");
        if with_metadata {
            write_file(
                &card.path().join("misc").join("version.txt"),
                VERSION_TXT.as_bytes(),
            );
        }
        card
    }

    fn files_under(root: &Path) -> Vec<PathBuf> {
        if !root.exists() {
            return Vec::new();
        }
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    fn plan(card: &Path, dest: &Path) -> OffloadPlan {
        OffloadPlan::from_config(&Config::default(), card.to_path_buf(), dest.to_path_buf())
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("dest");
        let offloader = Offloader::new(
            plan(&dir.path().join("no-card"), &dest),
            Box::new(OmitDevice),
        );

        let err = offloader.run().unwrap_err();
        assert!(matches!(err, OffloadError::SourceNotFound(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_missing_storage_dir_writes_nothing() {
        let card = TempDir::new().unwrap();
        write_file(&card.path().join("misc").join("version.txt"), VERSION_TXT.as_bytes());
        write_file(&card.path().join("MEDIA").join("GOPR0001.JPG"), b"jpg");
        let dest = TempDir::new().unwrap();

        let offloader = Offloader::new(plan(card.path(), dest.path()), Box::new(OmitDevice));
        let err = offloader.run().unwrap_err();

        assert!(matches!(err, OffloadError::StorageDirNotFound { .. }));
        assert!(err.to_string().contains("DCIM"));
        assert!(files_under(dest.path()).is_empty());
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_lowercase_storage_dir_is_accepted() {
        let card = TempDir::new().unwrap();
        write_file(&card.path().join("dcim").join("100GOPRO").join("GOPR0001.JPG"), b"jpg");
        let dest = TempDir::new().unwrap();

        let summary = Offloader::new(plan(card.path(), dest.path()), Box::new(OmitDevice))
            .run()
            .unwrap();
        assert_eq!(summary.report.copied(), 1);
    }

    #[test]
    fn test_empty_card_is_not_an_error() {
        let card = TempDir::new().unwrap();
        write_file(&card.path().join("DCIM").join("100GOPRO").join("notes.txt"), b"x");
        let dest = TempDir::new().unwrap();

        let summary = Offloader::new(plan(card.path(), dest.path()), Box::new(OmitDevice))
            .run()
            .unwrap();
        assert!(summary.device_label.is_none());
        assert_eq!(summary.report.files_found, 0);
        assert!(files_under(dest.path()).is_empty());
    }

    #[test]
    fn test_offload_with_detected_camera() {
        let card = make_card(true);
        let dest = TempDir::new().unwrap();

        let summary = Offloader::new(plan(card.path(), dest.path()), Box::new(OmitDevice))
            .run()
            .unwrap();

        assert_eq!(summary.device_label.as_deref(), Some("HERO9 Black"));
        assert_eq!(summary.report.copied(), 3);
        assert_eq!(summary.report.failed(), 0);

        let copied = files_under(dest.path());
        assert_eq!(copied.len(), 3);
        for file in &copied {
            let relative = file.strip_prefix(dest.path()).unwrap();
            let parts: Vec<_> = relative.components().collect();
            assert_eq!(parts.len(), 3, "unexpected layout {}", relative.display());
            assert_eq!(parts[1].as_os_str(), "HERO9 Black");
        }
        assert!(!copied
            .iter()
            .any(|f| f.to_string_lossy().ends_with(".THM")));
    }

    #[test]
    fn test_second_run_copies_nothing() {
        let card = make_card(true);
        let dest = TempDir::new().unwrap();

        let first = offload(
            &Config::default(),
            card.path(),
            dest.path(),
            Box::new(OmitDevice),
        )
        .unwrap();
        assert_eq!(first.report.copied(), 3);

        let second = offload(
            &Config::default(),
            card.path(),
            dest.path(),
            Box::new(OmitDevice),
        )
        .unwrap();
        assert_eq!(second.report.copied(), 0);
        assert_eq!(second.report.skipped(), 3);
        assert_eq!(files_under(dest.path()).len(), 3);
    }

    #[test]
    fn test_missing_metadata_uses_unknown_label() {
        let card = make_card(false);
        let dest = TempDir::new().unwrap();

        let summary = Offloader::new(
            plan(card.path(), dest.path()),
            Box::new(UnknownLabel::new("Unknown")),
        )
        .run()
        .unwrap();

        assert_eq!(summary.device_label.as_deref(), Some("Unknown"));
        assert_eq!(summary.report.copied(), 3);
        for file in files_under(dest.path()) {
            let relative = file.strip_prefix(dest.path()).unwrap();
            assert_eq!(relative.components().nth(1).unwrap().as_os_str(), "Unknown");
        }
    }

    #[test]
    fn test_missing_metadata_can_omit_device_folder() {
        let card = make_card(false);
        let dest = TempDir::new().unwrap();

        let summary = Offloader::new(plan(card.path(), dest.path()), Box::new(OmitDevice))
            .run()
            .unwrap();

        assert_eq!(summary.device_label.as_deref(), Some(""));
        assert_eq!(summary.report.copied(), 3);
        for file in files_under(dest.path()) {
            let relative = file.strip_prefix(dest.path()).unwrap();
            assert_eq!(relative.components().count(), 2);
        }
    }

    #[test]
    fn test_empty_camera_type_omits_device_folder() {
        let card = make_card(false);
        write_file(
            &card.path().join("misc").join("version.txt"),
            b"{\n  \"camera type\": \"\",\n}\n",
        );
        let dest = TempDir::new().unwrap();

        let summary = Offloader::new(
            plan(card.path(), dest.path()),
            Box::new(UnknownLabel::new("Unknown")),
        )
        .run()
        .unwrap();

        assert_eq!(summary.device_label.as_deref(), Some(""));
        assert_eq!(summary.report.copied(), 3);
        for file in files_under(dest.path()) {
            let relative = file.strip_prefix(dest.path()).unwrap();
            assert_eq!(relative.components().count(), 2);
        }
    }

    #[test]
    fn test_resolver_supplies_label_without_prompting() {
        let card = make_card(false);
        let dest = TempDir::new().unwrap();

        let summary = Offloader::new(
            plan(card.path(), dest.path()),
            Box::new(FixedLabel("Spare Cam".to_string())),
        )
        .run()
        .unwrap();
        assert_eq!(summary.device_label.as_deref(), Some("Spare Cam"));
    }

    #[test]
    fn test_label_override_skips_identification() {
        let card = make_card(true);
        let dest = TempDir::new().unwrap();

        let plan = plan(card.path(), dest.path()).label_override(Some("Helmet".to_string()));
        let summary = Offloader::new(plan, Box::new(OmitDevice)).run().unwrap();
        assert_eq!(summary.device_label.as_deref(), Some("Helmet"));
    }

    #[test]
    fn test_dry_run_leaves_destination_untouched() {
        let card = make_card(true);
        let dest = TempDir::new().unwrap();

        let plan = plan(card.path(), dest.path()).dry_run(true);
        let summary = Offloader::new(plan, Box::new(OmitDevice)).run().unwrap();

        assert_eq!(summary.report.planned(), 3);
        assert!(files_under(dest.path()).is_empty());
    }

    #[test]
    fn test_raw_photos_follow_configuration() {
        let card = make_card(true);
        write_file(
            &card.path().join("DCIM").join("100GOPRO").join("GOPR0001.GPR"),
            b"raw",
        );
        let dest = TempDir::new().unwrap();

        let mut config = Config::default();
        let summary = offload(&config, card.path(), dest.path(), Box::new(OmitDevice)).unwrap();
        assert_eq!(summary.report.copied(), 3);

        config.scan.include_raw = true;
        let summary = offload(&config, card.path(), dest.path(), Box::new(OmitDevice)).unwrap();
        assert_eq!(summary.report.copied(), 1);
        assert_eq!(summary.report.skipped(), 3);
    }

    #[test]
    fn test_progress_reaches_callback() {
        let card = make_card(true);
        let dest = TempDir::new().unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        Offloader::new(plan(card.path(), dest.path()), Box::new(OmitDevice))
            .with_progress(move |_| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            })
            .run()
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
