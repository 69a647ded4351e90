//! Camera model detection from the card's version metadata
//!
//! Cameras write a small JSON document (usually `misc/version.txt`) that names
//! the model under a `"camera type"` key. Firmware is known to emit trailing
//! commas, so the document is cleaned up before parsing. Any problem reading
//! or parsing the file degrades to [`UNKNOWN_DEVICE`]; it never fails a run.

use crate::core::config::OffloadConfig;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sentinel label for a device whose model could not be determined
pub const UNKNOWN_DEVICE: &str = "Unknown";

/// Whether `label` is the unknown sentinel (ASCII case-insensitive)
pub fn is_unknown(label: &str) -> bool {
    label.eq_ignore_ascii_case(UNKNOWN_DEVICE)
}

/// Reasons the metadata file could not yield a label
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read metadata file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("metadata is not a JSON object")]
    NotAnObject,

    #[error("metadata has no string value for '{0}'")]
    MissingKey(String),
}

/// Reads the device label from a card's metadata file
#[derive(Debug, Clone)]
pub struct DeviceIdentifier {
    /// Metadata file relative to the card root
    metadata_file: PathBuf,
    /// Key holding the camera model
    key: String,
}

impl DeviceIdentifier {
    /// Create an identifier for the given metadata file and key
    pub fn new<P: AsRef<Path>>(metadata_file: P, key: &str) -> Self {
        Self {
            metadata_file: metadata_file.as_ref().to_path_buf(),
            key: key.to_string(),
        }
    }

    /// Create an identifier from the offload configuration
    pub fn from_config(config: &OffloadConfig) -> Self {
        Self::new(&config.metadata_file, &config.metadata_key)
    }

    /// Full path of the metadata file under `source_root`
    pub fn metadata_path(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.metadata_file)
    }

    /// Detect the device label for a card, falling back to [`UNKNOWN_DEVICE`]
    pub fn identify(&self, source_root: &Path) -> String {
        match self.read_label(source_root) {
            Ok(label) => {
                info!("Detected camera: {}", label);
                label
            }
            Err(MetadataError::NotFound(path)) => {
                info!("No device metadata at {}", path.display());
                UNKNOWN_DEVICE.to_string()
            }
            Err(e) => {
                warn!(
                    "Could not identify camera from {}: {}",
                    self.metadata_path(source_root).display(),
                    e
                );
                UNKNOWN_DEVICE.to_string()
            }
        }
    }

    /// Read and parse the metadata file, reporting why it failed
    pub fn read_label(&self, source_root: &Path) -> Result<String, MetadataError> {
        let path = self.metadata_path(source_root);
        if !path.is_file() {
            return Err(MetadataError::NotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        debug!("Read {} bytes of device metadata", content.len());
        parse_label(&content, &self.key)
    }
}

/// Extract the value of `key` from a (possibly trailing-comma) JSON document
pub fn parse_label(content: &str, key: &str) -> Result<String, MetadataError> {
    let cleaned = strip_trailing_commas(content.trim_start_matches('\u{feff}'));
    let value: serde_json::Value = serde_json::from_str(&cleaned)?;
    let object = value.as_object().ok_or(MetadataError::NotAnObject)?;

    object
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| MetadataError::MissingKey(key.to_string()))
}

/// Drop commas that directly precede a closing `}` or `]`, ignoring string contents
fn strip_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_comma: Option<usize> = None;

    for c in json.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            ',' => {
                pending_comma = Some(out.len());
                out.push(c);
            }
            '}' | ']' => {
                if let Some(pos) = pending_comma.take() {
                    out.remove(pos);
                }
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                pending_comma = None;
                if c == '"' {
                    in_string = true;
                }
                out.push(c);
            }
        }
    }

    out
}
