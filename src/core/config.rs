//! Configuration module for the camera offload tool
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\camera_offload\config.toml
//! - Linux/macOS: ~/.config/camera_offload/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application name used for config directory
const APP_NAME: &str = "camera_offload";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Raw-photo extension added when `include_raw` is set
pub const RAW_EXTENSION: &str = "gpr";

/// Get the standard configuration directory for the application.
///
/// Returns:
/// - Windows: %APPDATA%\camera_offload
/// - Linux/macOS: ~/.config/camera_offload
pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config").join(APP_NAME))
    }
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Ensure the configuration directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = get_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::WriteError(config_dir.clone(), e.to_string()))?;
    }

    Ok(config_dir)
}

/// Initialize the configuration file if it doesn't exist.
///
/// With `reset` set, an existing file is replaced by the default template.
/// Returns the path to the config file.
pub fn init_config(reset: bool) -> Result<PathBuf, ConfigError> {
    let config_dir = ensure_config_dir()?;
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    if reset || !config_path.exists() {
        fs::write(&config_path, Config::generate_default_config())
            .map_err(|e| ConfigError::WriteError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// Open the configuration file in the default application.
pub fn open_config_in_editor() -> Result<PathBuf, ConfigError> {
    let config_path = init_config(false)?;

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", config_path.to_str().unwrap_or("")])
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&config_path)
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(&config_path)
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// What to do when the device label cannot be read from the card
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownDevicePolicy {
    /// File media under the configured unknown label
    #[default]
    Label,
    /// Leave the device segment out of destination paths
    Omit,
    /// Ask the operator for a label
    Prompt,
}

impl FromStr for UnknownDevicePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "label" => Ok(Self::Label),
            "omit" => Ok(Self::Omit),
            "prompt" => Ok(Self::Prompt),
            other => Err(format!(
                "unknown device policy '{}' (expected label, omit or prompt)",
                other
            )),
        }
    }
}

impl std::fmt::Display for UnknownDevicePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Label => "label",
            Self::Omit => "omit",
            Self::Prompt => "prompt",
        };
        write!(f, "{}", name)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source/destination and card layout settings
    pub offload: OffloadConfig,

    /// Media scan settings
    pub scan: ScanConfig,

    /// Device label settings
    pub device: DeviceConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Where media comes from and where it goes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    /// Card root used when no paths are given on the command line
    #[serde(alias = "defaultSource")]
    pub default_source: PathBuf,

    /// Destination root used when no paths are given on the command line
    #[serde(alias = "defaultDestination")]
    pub default_destination: PathBuf,

    /// Camera storage folder under the card root (matched case-insensitively)
    pub storage_dir: String,

    /// Device metadata file, relative to the card root
    pub metadata_file: PathBuf,

    /// Key in the metadata file holding the camera model
    pub metadata_key: String,
}

/// Which files count as media
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Allow-listed extensions, without the leading dot
    pub extensions: Vec<String>,

    /// Also pick up raw photos
    pub include_raw: bool,
}

/// Device label settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Fallback when the metadata file is missing or unreadable
    pub unknown_policy: UnknownDevicePolicy,

    /// Label used for unidentified devices
    pub unknown_label: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Also write log output to a file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            default_source: PathBuf::new(), // Empty = must be given on the command line
            default_destination: PathBuf::new(),
            storage_dir: "DCIM".to_string(),
            metadata_file: PathBuf::from("misc").join("version.txt"),
            metadata_key: "camera type".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["jpg".to_string(), "mp4".to_string()],
            include_raw: false,
        }
    }
}

impl ScanConfig {
    /// Normalized allow-list: lowercase, no leading dot, no duplicates,
    /// with the raw extension appended when enabled.
    pub fn allowed_extensions(&self) -> Vec<String> {
        let mut allowed: Vec<String> = Vec::new();
        let raw = self.include_raw.then(|| RAW_EXTENSION.to_string());

        for ext in self.extensions.iter().chain(raw.iter()) {
            let ext = ext.trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !allowed.contains(&ext) {
                allowed.push(ext);
            }
        }

        allowed
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            unknown_policy: UnknownDevicePolicy::Label,
            unknown_label: crate::device::UNKNOWN_DEVICE.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./camera_offload.log"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./camera_offload.toml (current directory)
    /// 2. Standard config location
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_candidates(&Self::candidate_paths())
    }

    /// Load the first existing file from `candidates`, or defaults if none exist
    fn load_from_candidates(candidates: &[PathBuf]) -> Result<Self, ConfigError> {
        match candidates.iter().find(|p| p.exists()) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./camera_offload.toml")];
        if let Some(config_path) = get_config_path() {
            paths.push(config_path);
        }
        paths
    }

    /// Get the path where the config file is (or would be) located.
    pub fn get_active_config_path() -> PathBuf {
        Self::candidate_paths()
            .into_iter()
            .find(|p| p.exists())
            .or_else(get_config_path)
            .unwrap_or_else(|| PathBuf::from("./camera_offload.toml"))
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::WriteError(path.as_ref().to_path_buf(), e.to_string()))?;

        Ok(())
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }

    /// Pick the source and destination roots for a run.
    ///
    /// Paths from the command line win when both are present; otherwise the
    /// configured defaults are used and must both be set.
    pub fn resolve_locations(
        &self,
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
    ) -> Result<(PathBuf, PathBuf), ConfigError> {
        if let (Some(source), Some(destination)) = (source, destination) {
            return Ok((source, destination));
        }

        if self.offload.default_source.as_os_str().is_empty() {
            return Err(ConfigError::MissingLocation("defaultSource"));
        }
        if self.offload.default_destination.as_os_str().is_empty() {
            return Err(ConfigError::MissingLocation("defaultDestination"));
        }

        Ok((
            self.offload.default_source.clone(),
            self.offload.default_destination.clone(),
        ))
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to serialize configuration to TOML
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
    /// Could not determine config directory
    ConfigDirNotFound,
    /// Failed to open config file in editor
    OpenError(PathBuf, String),
    /// No paths on the command line and no default configured
    MissingLocation(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ParseError(path, err) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(
                    f,
                    "Failed to write config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ConfigDirNotFound => {
                write!(f, "Could not determine configuration directory")
            }
            ConfigError::OpenError(path, err) => {
                write!(
                    f,
                    "Failed to open config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::MissingLocation(key) => {
                write!(
                    f,
                    "No source/destination given and '{}' is not set in the configuration",
                    key
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.offload.storage_dir, "DCIM");
        assert_eq!(config.offload.metadata_key, "camera type");
        assert_eq!(
            config.offload.metadata_file,
            PathBuf::from("misc").join("version.txt")
        );
        assert_eq!(config.device.unknown_policy, UnknownDevicePolicy::Label);
        assert_eq!(config.device.unknown_label, "Unknown");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_allowed_extensions_default() {
        let scan = ScanConfig::default();
        assert_eq!(scan.allowed_extensions(), vec!["jpg", "mp4"]);
    }

    #[test]
    fn test_allowed_extensions_with_raw() {
        let scan = ScanConfig {
            include_raw: true,
            ..Default::default()
        };
        assert_eq!(scan.allowed_extensions(), vec!["jpg", "mp4", "gpr"]);
    }

    #[test]
    fn test_allowed_extensions_normalized() {
        let scan = ScanConfig {
            extensions: vec![
                ".JPG".to_string(),
                "jpg".to_string(),
                " Mp4 ".to_string(),
                "".to_string(),
                "GPR".to_string(),
            ],
            include_raw: true,
        };
        assert_eq!(scan.allowed_extensions(), vec!["jpg", "mp4", "gpr"]);
    }

    #[test]
    fn test_unknown_policy_from_str() {
        assert_eq!(
            "label".parse::<UnknownDevicePolicy>().unwrap(),
            UnknownDevicePolicy::Label
        );
        assert_eq!(
            "OMIT".parse::<UnknownDevicePolicy>().unwrap(),
            UnknownDevicePolicy::Omit
        );
        assert_eq!(
            " prompt ".parse::<UnknownDevicePolicy>().unwrap(),
            UnknownDevicePolicy::Prompt
        );
        assert!("abort".parse::<UnknownDevicePolicy>().is_err());
    }

    #[test]
    fn test_parse_camel_case_keys() {
        let toml = r#"
            [offload]
            defaultSource = "/media/card"
            defaultDestination = "/srv/footage"

            [device]
            unknown_policy = "omit"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.offload.default_source, PathBuf::from("/media/card"));
        assert_eq!(
            config.offload.default_destination,
            PathBuf::from("/srv/footage")
        );
        assert_eq!(config.device.unknown_policy, UnknownDevicePolicy::Omit);
        // Untouched sections keep their defaults
        assert_eq!(config.offload.storage_dir, "DCIM");
        assert_eq!(config.scan.allowed_extensions(), vec!["jpg", "mp4"]);
    }

    #[test]
    fn test_resolve_locations_prefers_arguments() {
        let mut config = Config::default();
        config.offload.default_source = PathBuf::from("/config/src");
        config.offload.default_destination = PathBuf::from("/config/dst");

        let (src, dst) = config
            .resolve_locations(Some(PathBuf::from("/a")), Some(PathBuf::from("/b")))
            .unwrap();
        assert_eq!(src, PathBuf::from("/a"));
        assert_eq!(dst, PathBuf::from("/b"));
    }

    #[test]
    fn test_resolve_locations_falls_back_to_config() {
        let mut config = Config::default();
        config.offload.default_source = PathBuf::from("/config/src");
        config.offload.default_destination = PathBuf::from("/config/dst");

        let (src, dst) = config.resolve_locations(None, None).unwrap();
        assert_eq!(src, PathBuf::from("/config/src"));
        assert_eq!(dst, PathBuf::from("/config/dst"));
    }

    #[test]
    fn test_resolve_locations_missing_defaults() {
        let config = Config::default();
        let err = config.resolve_locations(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingLocation("defaultSource")));

        let mut config = Config::default();
        config.offload.default_source = PathBuf::from("/config/src");
        let err = config.resolve_locations(None, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingLocation("defaultDestination")
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[offload\nstorage_dir = ").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_, _)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.offload.default_source = PathBuf::from("/media/card");
        config.scan.include_raw = true;
        config.device.unknown_policy = UnknownDevicePolicy::Prompt;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.offload.default_source, PathBuf::from("/media/card"));
        assert!(loaded.scan.include_raw);
        assert_eq!(loaded.device.unknown_policy, UnknownDevicePolicy::Prompt);
    }

    #[test]
    fn test_load_from_candidates_without_files() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_candidates(&[dir.path().join("missing.toml")]).unwrap();
        assert_eq!(config.offload.storage_dir, "DCIM");
    }

    #[test]
    fn test_default_config_template_parses() {
        let config: Config = toml::from_str(&Config::generate_default_config()).unwrap();
        assert_eq!(config.offload.storage_dir, "DCIM");
        assert_eq!(config.scan.allowed_extensions(), vec!["jpg", "mp4"]);
    }
}
