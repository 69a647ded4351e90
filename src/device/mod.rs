//! Device identification module
//!
//! Works out which camera a card came from, so media can be filed per device.
//!
//! # Submodules
//!
//! - `identifier` - Reads the camera model from the card's version metadata
//! - `resolver` - Strategies for labelling cameras that could not be identified

pub mod identifier;
pub mod resolver;

pub use identifier::{is_unknown, DeviceIdentifier, MetadataError, UNKNOWN_DEVICE};
pub use resolver::{
    resolve_label, resolver_for_policy, sanitize_label, FixedLabel, LabelResolver, OmitDevice,
    PromptLabel, UnknownLabel,
};
