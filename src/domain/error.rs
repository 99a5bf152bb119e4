//! Domain-level error types for axis-presets.
//!
//! All errors are typed with `thiserror`. Lock contention is the one
//! condition the store recovers from on its own; everything else
//! propagates to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the preset store and its collaborators.
#[derive(Error, Debug)]
pub enum PresetError {
    /// Bad preset name or value, raised before any I/O.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The category has no configured storage root.
    #[error("Unknown preset category: {category}")]
    UnknownCategory { category: String },

    /// The document lock could not be obtained without blocking.
    #[error("Unable to acquire file lock for {}", .path.display())]
    LockUnavailable {
        path: PathBuf,
        #[source]
        source: Option<nix::errno::Errno>,
    },

    /// A preset document exists but cannot be deserialized.
    #[error("Failed to load preset document {}: {message}", .path.display())]
    Load {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    /// A preset document could not be serialized.
    #[error("Failed to serialize preset document: {message}")]
    Serialize {
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Comment-only update against a preset that does not exist.
    #[error("No {category} preset named '{name}'")]
    MissingRecord { category: String, name: String },

    /// No accessor with this name is currently installed.
    #[error("No operation named '{name}' is installed")]
    UnknownAccessor { name: String },

    /// The mover rejected or failed a motion request.
    #[error("Move failed: {message}")]
    Move { message: String },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl PresetError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a load error for a corrupt document.
    pub fn load(path: impl Into<PathBuf>, err: serde_yaml::Error) -> Self {
        Self::Load {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a serialization error.
    pub fn serialize(err: serde_yaml::Error) -> Self {
        Self::Serialize {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a JSON error.
    pub fn json(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Whether this is an IO error for a file that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Io { source: Some(err), .. } if err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Whether this error is lock contention, which callers recover from.
    #[must_use]
    pub const fn is_lock_unavailable(&self) -> bool {
        matches!(self, Self::LockUnavailable { .. })
    }
}

/// Result type alias using `PresetError`.
pub type Result<T> = std::result::Result<T, PresetError>;
