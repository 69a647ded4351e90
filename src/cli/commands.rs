//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::progress::{
    format_bytes, format_duration, print_error, print_header, print_info, print_success,
    print_warning, OffloadProgress,
};
use crate::cli::{Args, Commands};
use crate::core::config::{get_config_path, init_config, open_config_in_editor, Config};
use crate::core::offload::{OffloadPlan, OffloadSummary, Offloader};
use crate::device::{
    is_unknown, resolver_for_policy, DeviceIdentifier, MetadataError, UNKNOWN_DEVICE,
};
use anyhow::Result;
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(args: &Args, config: &mut Config) {
    if let Some(ref extensions) = args.extensions {
        config.scan.extensions = extensions.clone();
    }
    if args.include_raw {
        config.scan.include_raw = true;
    }
    if let Some(ref policy) = args.unknown_device {
        match policy.parse() {
            Ok(policy) => config.device.unknown_policy = policy,
            Err(e) => eprintln!("Warning: {}", e),
        }
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
}

/// Run the appropriate command based on CLI arguments
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Some(Commands::Identify { source }) => {
            identify_card(config, source.clone())?;
        }
        Some(Commands::Config { path, reset }) => {
            handle_config_command(*path, *reset)?;
        }
        Some(Commands::GenerateConfig { output }) => {
            generate_config_file(output.clone())?;
        }
        Some(Commands::ShowConfig) => {
            show_config(config);
        }
        None => {
            offload_card(args, config, shutdown_flag)?;
        }
    }

    Ok(())
}

/// Offload the card named on the command line (or in the configuration)
pub fn offload_card(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    let (source, destination) =
        config.resolve_locations(args.source.clone(), args.destination.clone())?;

    print_header("📷 Camera Offload");
    print_info(&format!("Source:      {}", source.display()));
    print_info(&format!("Destination: {}", destination.display()));
    if args.dry_run {
        print_warning("Dry run: nothing will be copied");
    }
    println!();

    let plan = OffloadPlan::from_config(config, source, destination)
        .label_override(args.device_label.clone())
        .dry_run(args.dry_run);

    let progress = Arc::new(OffloadProgress::new(0));
    let progress_clone = progress.clone();

    let offloader = Offloader::new(plan, resolver_for_policy(&config.device))
        .with_shutdown_flag(shutdown_flag)
        .with_progress(move |update| progress_clone.handle(&update));

    match offloader.run() {
        Ok(summary) => {
            progress.finish();
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            progress.finish_with_error("Offload aborted");
            Err(e.into())
        }
    }
}

/// Print the end-of-run summary
fn print_summary(summary: &OffloadSummary) {
    let report = &summary.report;
    println!();

    if report.files_found == 0 {
        print_warning(&format!(
            "No media files found in {}",
            summary.storage_path.display()
        ));
        return;
    }

    match summary.device_label.as_deref() {
        Some("") => print_info("Camera folder: (omitted)"),
        Some(label) => print_info(&format!("Camera folder: {}", label)),
        None => {}
    }
    print_info(&format!("Files found:   {}", report.files_found));
    print_success(&format!(
        "Copied:        {} ({})",
        report.copied(),
        format_bytes(report.bytes_copied())
    ));
    if report.planned() > 0 {
        print_info(&format!("Would copy:    {}", report.planned()));
    }
    print_info(&format!("Skipped:       {}", report.skipped()));
    if report.failed() > 0 {
        print_error(&format!("Failed:        {}", report.failed()));
        for failure in report.failures() {
            print_error(&format!("  {}", failure.source().display()));
        }
    }
    if report.was_interrupted() {
        print_warning(&format!(
            "Interrupted:   {} files not attempted",
            report.not_attempted
        ));
    }
    print_info(&format!(
        "Duration:      {}",
        format_duration(Duration::from_millis(report.duration_ms))
    ));

    println!();
    println!("Done.");
    info!("Offload complete: {}", report);
}

/// Print the camera model detected on a card and return it
pub fn identify_card(config: &Config, source: Option<PathBuf>) -> Result<String> {
    let source = match source {
        Some(source) => source,
        None => config.resolve_locations(None, None)?.0,
    };

    let identifier = DeviceIdentifier::from_config(&config.offload);
    let metadata_path = identifier.metadata_path(&source);

    let label = match identifier.read_label(&source) {
        Ok(label) => {
            println!("{}", label);
            if is_unknown(&label) {
                print_warning("Card reports an unknown camera type");
            }
            label
        }
        Err(MetadataError::NotFound(_)) => {
            println!("{}", UNKNOWN_DEVICE);
            print_warning(&format!("No metadata file at {}", metadata_path.display()));
            UNKNOWN_DEVICE.to_string()
        }
        Err(e) => {
            println!("{}", UNKNOWN_DEVICE);
            print_warning(&format!("{}: {}", metadata_path.display(), e));
            UNKNOWN_DEVICE.to_string()
        }
    };

    Ok(label)
}

/// Handle the `config` command - open, show path, or reset the config file
pub fn handle_config_command(show_path: bool, reset: bool) -> Result<()> {
    if show_path {
        match get_config_path() {
            Some(path) => println!("{}", path.display()),
            None => print_error("Could not determine configuration directory"),
        }
        return Ok(());
    }

    if reset {
        let path = init_config(true)?;
        print_success(&format!("Config reset to defaults: {}", path.display()));
        return Ok(());
    }

    let path = open_config_in_editor()?;
    print_success(&format!("Opened config file: {}", path.display()));
    Ok(())
}

/// Write the default configuration to `output` (or the standard location)
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let path = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, Config::generate_default_config())?;
            path
        }
        None => init_config(false)?,
    };

    print_success(&format!("Configuration written to {}", path.display()));
    Ok(())
}

/// Print the effective configuration
pub fn show_config(config: &Config) {
    let display_path = |p: &PathBuf| {
        if p.as_os_str().is_empty() {
            "(not set)".to_string()
        } else {
            p.display().to_string()
        }
    };

    print_header("Current Configuration");
    println!("Config file: {}", Config::get_active_config_path().display());
    println!();
    println!("[offload]");
    println!(
        "  default_source      = {}",
        display_path(&config.offload.default_source)
    );
    println!(
        "  default_destination = {}",
        display_path(&config.offload.default_destination)
    );
    println!("  storage_dir         = {}", config.offload.storage_dir);
    println!(
        "  metadata_file       = {}",
        config.offload.metadata_file.display()
    );
    println!("  metadata_key        = {}", config.offload.metadata_key);
    println!();
    println!("[scan]");
    println!(
        "  extensions          = {}",
        config.scan.allowed_extensions().join(", ")
    );
    println!("  include_raw         = {}", config.scan.include_raw);
    println!();
    println!("[device]");
    println!("  unknown_policy      = {}", config.device.unknown_policy);
    println!("  unknown_label       = {}", config.device.unknown_label);
    println!();
    println!("[logging]");
    println!("  level               = {}", config.logging.level);
    println!("  log_to_file         = {}", config.logging.log_to_file);
    println!(
        "  log_file            = {}",
        config.logging.log_file.display()
    );
}
