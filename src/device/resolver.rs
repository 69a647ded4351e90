//! Strategies for naming a device the card could not identify
//!
//! The pipeline never talks to the console directly. When identification
//! yields the unknown sentinel it asks a [`LabelResolver`], which may use a
//! fixed answer (tests, scripted runs) or prompt the operator.

use super::identifier::is_unknown;
use crate::core::config::{DeviceConfig, UnknownDevicePolicy};
use dialoguer::Input;
use log::{info, warn};

/// Decides the label to use when the device is unknown.
///
/// An empty label means "leave the device folder out of destination paths".
pub trait LabelResolver {
    /// Produce a label for an unidentified device; `detected` is the sentinel
    fn resolve_unknown(&self, detected: &str) -> String;
}

/// Always answers with the same label
#[derive(Debug, Clone)]
pub struct FixedLabel(pub String);

impl LabelResolver for FixedLabel {
    fn resolve_unknown(&self, _detected: &str) -> String {
        self.0.clone()
    }
}

/// Keeps the unknown sentinel (or a configured replacement) as the label
#[derive(Debug, Clone)]
pub struct UnknownLabel {
    label: String,
}

impl UnknownLabel {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

impl LabelResolver for UnknownLabel {
    fn resolve_unknown(&self, detected: &str) -> String {
        if self.label.trim().is_empty() {
            detected.to_string()
        } else {
            self.label.clone()
        }
    }
}

/// Files unknown-device media without a device folder
#[derive(Debug, Clone, Default)]
pub struct OmitDevice;

impl LabelResolver for OmitDevice {
    fn resolve_unknown(&self, _detected: &str) -> String {
        String::new()
    }
}

/// Asks the operator on the terminal
#[derive(Debug, Clone)]
pub struct PromptLabel {
    /// Used when the prompt cannot be shown (no terminal, read error)
    fallback: String,
}

impl PromptLabel {
    pub fn new(fallback: &str) -> Self {
        Self {
            fallback: fallback.to_string(),
        }
    }
}

impl LabelResolver for PromptLabel {
    fn resolve_unknown(&self, detected: &str) -> String {
        println!();
        println!("Could not determine the camera model from the card.");

        let answer: Result<String, _> = Input::new()
            .with_prompt("Enter a camera name (leave empty to skip the camera folder)")
            .allow_empty(true)
            .interact_text();

        match answer {
            Ok(label) => {
                let label = label.trim().to_string();
                if label.is_empty() {
                    info!("No camera name given, omitting camera folder");
                }
                label
            }
            Err(e) => {
                let label = if self.fallback.trim().is_empty() {
                    detected.to_string()
                } else {
                    self.fallback.clone()
                };
                warn!("Failed to read camera name ({}), using '{}'", e, label);
                label
            }
        }
    }
}

/// Build the resolver matching the configured policy
pub fn resolver_for_policy(config: &DeviceConfig) -> Box<dyn LabelResolver> {
    match config.unknown_policy {
        UnknownDevicePolicy::Label => Box::new(UnknownLabel::new(&config.unknown_label)),
        UnknownDevicePolicy::Omit => Box::new(OmitDevice),
        UnknownDevicePolicy::Prompt => Box::new(PromptLabel::new(&config.unknown_label)),
    }
}

/// Final device label for destination paths.
///
/// Known labels pass through; the unknown sentinel goes to `resolver`. The
/// result is made safe for use as a single directory name.
pub fn resolve_label(detected: &str, resolver: &dyn LabelResolver) -> String {
    let label = if is_unknown(detected) {
        resolver.resolve_unknown(detected)
    } else {
        detected.to_string()
    };
    sanitize_label(&label)
}

/// Replace characters that cannot appear in a directory name
pub fn sanitize_label(label: &str) -> String {
    let cleaned = label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string();

    // A bare "." or ".." would point outside the date folder
    if !cleaned.is_empty() && cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len())
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::UNKNOWN_DEVICE;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("HERO9 Black"), "HERO9 Black");
        assert_eq!(sanitize_label("  Hero9 "), "Hero9");
        assert_eq!(sanitize_label("Cam: Test"), "Cam_ Test");
        assert_eq!(sanitize_label("A/B\\C"), "A_B_C");
        assert_eq!(sanitize_label(".."), "__");
        assert_eq!(sanitize_label("v1.0"), "v1.0");
        assert_eq!(sanitize_label(""), "");
    }

    #[test]
    fn test_known_label_passes_through() {
        assert_eq!(resolve_label("Hero9", &OmitDevice), "Hero9");
        assert_eq!(
            resolve_label("Hero9", &FixedLabel("Other".to_string())),
            "Hero9"
        );
    }

    #[test]
    fn test_unknown_label_strategies() {
        assert_eq!(
            resolve_label(UNKNOWN_DEVICE, &UnknownLabel::new("Unknown")),
            "Unknown"
        );
        assert_eq!(
            resolve_label(UNKNOWN_DEVICE, &UnknownLabel::new("Unsorted")),
            "Unsorted"
        );
        assert_eq!(resolve_label(UNKNOWN_DEVICE, &UnknownLabel::new("")), "Unknown");
        assert_eq!(resolve_label(UNKNOWN_DEVICE, &OmitDevice), "");
        assert_eq!(
            resolve_label("unknown", &FixedLabel("Spare Cam".to_string())),
            "Spare Cam"
        );
    }

    #[test]
    fn test_fixed_label_is_sanitized() {
        assert_eq!(
            resolve_label(UNKNOWN_DEVICE, &FixedLabel("../escape".to_string())),
            ".._escape"
        );
    }

    #[test]
    fn test_resolver_for_policy() {
        let mut config = DeviceConfig::default();
        assert_eq!(
            resolver_for_policy(&config).resolve_unknown(UNKNOWN_DEVICE),
            "Unknown"
        );

        config.unknown_policy = UnknownDevicePolicy::Omit;
        assert_eq!(
            resolver_for_policy(&config).resolve_unknown(UNKNOWN_DEVICE),
            ""
        );
    }
}
