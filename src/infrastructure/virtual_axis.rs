//! File-backed soft axis.
//!
//! Keeps an axis position in a small JSON file so the CLI has a mover to
//! drive and read back without hardware.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MoveStatus, Mover, PresetError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AxisState {
    position: f64,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// A mover whose position lives in `<state_dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct VirtualAxis {
    name: String,
    path: PathBuf,
}

impl VirtualAxis {
    /// Create an axis named `name` storing state under `state_dir`.
    #[must_use]
    pub fn new(name: impl Into<String>, state_dir: &Path) -> Self {
        let name = name.into();
        let path = state_dir.join(format!("{name}.json"));
        Self { name, path }
    }

    /// Path of the state file.
    #[must_use]
    pub fn state_path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the stored position.
    ///
    /// # Errors
    /// Returns error if the state file cannot be written.
    pub fn set_position(&self, position: f64) -> Result<()> {
        if !position.is_finite() {
            return Err(PresetError::validation(format!(
                "position must be a finite number, got {position}"
            )));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PresetError::io("Failed to create axis state directory", e))?;
        }

        let state = AxisState {
            position,
            updated_at: Some(Utc::now()),
        };
        let content = serde_json::to_string_pretty(&state).map_err(PresetError::json)?;

        fs::write(&self.path, content)
            .map_err(|e| PresetError::io(format!("Failed to write {}", self.path.display()), e))?;

        tracing::debug!(axis = %self.name, position, "axis position stored");
        Ok(())
    }
}

impl Mover for VirtualAxis {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<f64> {
        if !self.path.exists() {
            return Ok(0.0);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| PresetError::io(format!("Failed to read {}", self.path.display()), e))?;
        let state: AxisState = serde_json::from_str(&content).map_err(|e| PresetError::Json {
            message: format!("Corrupt axis state {}: {e}", self.path.display()),
            source: Some(e),
        })?;

        Ok(state.position)
    }

    fn move_to(&self, target: f64, _timeout: Option<Duration>, _wait: bool) -> Result<MoveStatus> {
        self.set_position(target).map_err(|e| PresetError::Move {
            message: e.to_string(),
        })?;
        Ok(MoveStatus { target, done: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unset_axis_reads_zero() {
        let dir = tempdir().unwrap();
        let axis = VirtualAxis::new("x_motor", dir.path());
        assert_eq!(axis.position().unwrap(), 0.0);
    }

    #[test]
    fn test_move_persists_position() {
        let dir = tempdir().unwrap();
        let axis = VirtualAxis::new("x_motor", &dir.path().join("axes"));

        let status = axis.move_to(12.5, None, true).unwrap();
        assert!(status.done);

        let reopened = VirtualAxis::new("x_motor", &dir.path().join("axes"));
        assert_eq!(reopened.position().unwrap(), 12.5);
    }

    #[test]
    fn test_corrupt_state_is_json_error() {
        let dir = tempdir().unwrap();
        let axis = VirtualAxis::new("x_motor", dir.path());
        fs::write(axis.state_path(), "{ \"position\": ").unwrap();
        assert!(matches!(axis.position(), Err(PresetError::Json { .. })));
    }

    #[test]
    fn test_rejects_non_finite() {
        let dir = tempdir().unwrap();
        let axis = VirtualAxis::new("x_motor", dir.path());
        assert!(matches!(
            axis.set_position(f64::NAN),
            Err(PresetError::Validation { .. })
        ));
    }
}
