//! Core functionality module
//!
//! This module contains the core business logic for the camera offload tool,
//! including configuration management, error handling, media discovery and
//! file relocation.
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and management
//! - `error` - Error types and result aliases
//! - `scanner` - Recursive media discovery on the card
//! - `relocator` - Dated, per-device copying with skip-if-present
//! - `offload` - The end-to-end pipeline

pub mod config;
pub mod error;
pub mod offload;
pub mod relocator;
pub mod scanner;
