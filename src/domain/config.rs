//! Configuration model for preset storage.
//!
//! The category -> root mapping is owned by the configuration, not by any
//! store; stores receive it at construction and again on `reconfigure`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{PresetError, Result};

/// What to do once the bounded lock wait has elapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnTimeout {
    /// Fall back to an unbounded blocking acquisition.
    #[default]
    Block,
    /// Make one last non-blocking attempt and give up if still busy.
    Abandon,
}

/// File lock behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Bounded wait before the `on_timeout` policy applies.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Policy after the bounded wait.
    #[serde(default)]
    pub on_timeout: OnTimeout,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            on_timeout: OnTimeout::default(),
        }
    }
}

const fn default_timeout_secs() -> f64 {
    1.0
}

impl LockConfig {
    /// The bounded wait as a `Duration`; negative or NaN values clamp to zero.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::ZERO)
    }
}

/// Settings for the file-backed virtual axis used by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Directory holding one position file per axis.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

/// Complete preset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetConfig {
    /// File extension of preset documents, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Category -> root directory.
    #[serde(default)]
    pub paths: BTreeMap<String, PathBuf>,

    /// Lock behaviour.
    #[serde(default)]
    pub lock: LockConfig,

    /// Virtual axis settings.
    #[serde(default)]
    pub axes: AxisConfig,
}

fn default_extension() -> String {
    "yml".to_string()
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            paths: BTreeMap::new(),
            lock: LockConfig::default(),
            axes: AxisConfig::default(),
        }
    }
}

impl PresetConfig {
    /// Build a configuration from category/root pairs.
    #[must_use]
    pub fn with_paths<I, K, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Set the lock policy.
    #[must_use]
    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    /// Configured categories in stable order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Root directory for a category.
    ///
    /// # Errors
    /// Returns `UnknownCategory` if the category is not configured.
    pub fn root_for(&self, category: &str) -> Result<&Path> {
        self.paths
            .get(category)
            .map(PathBuf::as_path)
            .ok_or_else(|| PresetError::UnknownCategory {
                category: category.to_string(),
            })
    }

    /// `root_for(category) / (owner + extension)`.
    ///
    /// # Errors
    /// Returns `UnknownCategory` if the category is not configured.
    pub fn document_path(&self, category: &str, owner: &str) -> Result<PathBuf> {
        let root = self.root_for(category)?;
        Ok(root.join(format!("{owner}.{}", self.extension)))
    }

    /// Directory for virtual axis state, defaulting under the data dir.
    #[must_use]
    pub fn axis_state_dir(&self) -> PathBuf {
        self.axes
            .state_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("axes"))
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("axis-presets")
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("axis-presets")
            .join("config.toml")
    }
}
