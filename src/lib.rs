//! Axis Presets - named positions for controllable axes.
//!
//! Presets are stored as one YAML document per device and category,
//! shared between processes through advisory file locks. A
//! [`PresetStore`] caches the documents of one device and exposes
//! `add_*`, `mv_*`, `umv_*` and `wm_*` operations for every active preset.

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

pub use application::{reconfigure, PresetPosition, PresetState, PresetStore, UpdateOutcome};
pub use domain::{Mover, PresetConfig, PresetError, Result};
