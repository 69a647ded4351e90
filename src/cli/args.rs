//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Copy photos and videos off a camera memory card, organised by date and camera
#[derive(Parser, Debug)]
#[command(name = "camera-offload")]
#[command(version)]
#[command(
    about = "Copy media off a camera card into <dest>/<YYYY-MM-DD>/<camera>/<HHMMSS>_<name>",
    long_about = None
)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Card root (requires DESTINATION; both default to the configured paths)
    #[arg(value_name = "SOURCE", requires = "destination")]
    pub source: Option<PathBuf>,

    /// Destination root
    #[arg(value_name = "DESTINATION", requires = "source")]
    pub destination: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Media extensions to copy, comma-separated (overrides config)
    #[arg(short, long, value_delimiter = ',', value_name = "EXT")]
    pub extensions: Option<Vec<String>>,

    /// Also copy raw photos (.gpr)
    #[arg(long)]
    pub include_raw: bool,

    /// What to do when the camera cannot be identified: label, omit, or prompt
    #[arg(long, value_name = "POLICY", value_parser = ["label", "omit", "prompt"])]
    pub unknown_device: Option<String>,

    /// Use this camera folder name instead of reading it from the card
    /// (an empty value leaves the camera folder out)
    #[arg(short, long, value_name = "LABEL")]
    pub device_label: Option<String>,

    /// Show where files would go without copying anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the camera model detected on a card
    Identify {
        /// Card root (defaults to the configured source)
        source: Option<PathBuf>,
    },

    /// Open the configuration file in your default editor
    ///
    /// The config file is stored at:
    /// - Windows: %APPDATA%\camera_offload\config.toml
    /// - Linux/macOS: ~/.config/camera_offload/config.toml
    ///
    /// If no config file exists, a default one will be created.
    Config {
        /// Show the config file path without opening it
        #[arg(long)]
        path: bool,

        /// Reset config to defaults (creates a fresh config file)
        #[arg(long)]
        reset: bool,
    },

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show current configuration
    ShowConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_paths() {
        let args = Args::try_parse_from(["camera-offload", "/media/card", "/srv/footage"]).unwrap();
        assert_eq!(args.source, Some(PathBuf::from("/media/card")));
        assert_eq!(args.destination, Some(PathBuf::from("/srv/footage")));
        assert!(args.command.is_none());
    }

    #[test]
    fn test_no_paths() {
        let args = Args::try_parse_from(["camera-offload"]).unwrap();
        assert!(args.source.is_none());
        assert!(args.destination.is_none());
    }

    #[test]
    fn test_single_path_is_rejected() {
        assert!(Args::try_parse_from(["camera-offload", "/media/card"]).is_err());
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "camera-offload",
            "--extensions",
            "jpg,mp4,gpr",
            "--unknown-device",
            "omit",
            "--dry-run",
            "/media/card",
            "/srv/footage",
        ])
        .unwrap();
        assert_eq!(
            args.extensions,
            Some(vec!["jpg".to_string(), "mp4".to_string(), "gpr".to_string()])
        );
        assert_eq!(args.unknown_device.as_deref(), Some("omit"));
        assert!(args.dry_run);
    }

    #[test]
    fn test_invalid_policy() {
        assert!(Args::try_parse_from(["camera-offload", "--unknown-device", "abort"]).is_err());
    }

    #[test]
    fn test_empty_device_label() {
        let args = Args::try_parse_from(["camera-offload", "--device-label", ""]).unwrap();
        assert_eq!(args.device_label.as_deref(), Some(""));
    }

    #[test]
    fn test_subcommands() {
        let args = Args::try_parse_from(["camera-offload", "identify", "/media/card"]).unwrap();
        match args.command {
            Some(Commands::Identify { source }) => {
                assert_eq!(source, Some(PathBuf::from("/media/card")))
            }
            other => panic!("unexpected command {:?}", other),
        }

        let args = Args::try_parse_from(["camera-offload", "show-config"]).unwrap();
        assert!(matches!(args.command, Some(Commands::ShowConfig)));
    }
}
