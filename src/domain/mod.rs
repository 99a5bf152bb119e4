//! Domain layer - core types for preset storage.
//!
//! This layer contains the document model, configuration and error types
//! without any I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod mover;

pub use config::{AxisConfig, LockConfig, OnTimeout, PresetConfig};
pub use error::{PresetError, Result};
pub use models::{format_note, Document, History, HistoryEntry, PresetRecord, HISTORY_TIME_FORMAT};
pub use mover::{MoveStatus, Mover};
