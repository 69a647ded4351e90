//! Camera Offload Library
//!
//! Copies photos and videos off an action camera's memory card into a
//! destination tree organised by date and camera model:
//!
//! ```text
//! <destination>/<YYYY-MM-DD>/<camera>/<HHMMSS>_<original name>
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Configuration, errors, media scanning, relocation and the
//!   offload pipeline
//! - [`device`] - Camera identification from the card's metadata file and
//!   strategies for unidentified cameras
//! - [`cli`] - Command-line interface (only used by the binary)
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use camera_offload::core::config::Config;
//! use camera_offload::core::offload::{OffloadPlan, Offloader};
//! use camera_offload::device::OmitDevice;
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let plan = OffloadPlan::from_config(
//!         &config,
//!         PathBuf::from("/media/card"),
//!         PathBuf::from("/srv/footage"),
//!     );
//!
//!     let summary = Offloader::new(plan, Box::new(OmitDevice)).run()?;
//!     println!("{}", summary.report);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Idempotent** - Destination names are derived from creation time, so
//!   re-running over the same card skips everything already copied
//! - **Never overwrites** - Existing destination files are left alone
//! - **Fault tolerant** - A file that cannot be copied is reported and the
//!   rest of the card is still offloaded

pub mod cli;
pub mod core;
pub mod device;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
