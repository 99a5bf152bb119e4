//! Configuration file management.
//!
//! Reads the TOML file that maps preset categories to storage roots, and
//! writes a commented starter file for `init-config`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::domain::{PresetConfig, PresetError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Axis Presets Configuration
# Auto-generated - edit as needed

# Extension of preset documents
extension = "yml"

[paths]
# One storage root per preset category, shared by every device
# beamline = "/shared/presets/beamline"
# user = "/shared/presets/user"

[lock]
# Seconds to wait for a busy preset file
timeout_secs = 1.0

# After the wait: "block" keeps waiting, "abandon" gives up and logs
on_timeout = "block"

[axes]
# Where the virtual axis keeps its position (optional)
# state_dir = "/tmp/axis-presets/axes"
"#;

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields the default configuration, so the CLI works
/// before `init-config` has ever run.
///
/// # Errors
/// Returns `Io` if the file exists but cannot be read and `Config` if it
/// is not valid TOML for [`PresetConfig`].
pub fn load_config(path: Option<&Path>) -> Result<PresetConfig> {
    let path = path.map_or_else(PresetConfig::default_config_path, Path::to_path_buf);

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(PresetConfig::default());
        }
        Err(e) => {
            return Err(PresetError::io(
                format!("Failed to read config file: {}", path.display()),
                e,
            ))
        }
    };

    let config: PresetConfig = toml::from_str(&content).map_err(|e| PresetError::Config {
        message: format!("{}: {e}", path.display()),
    })?;
    tracing::debug!(path = %path.display(), categories = config.paths.len(), "loaded config");
    Ok(config)
}

/// Create the default configuration file if it doesn't exist.
///
/// Returns `true` if a file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PresetError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| PresetError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OnTimeout;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: PresetConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.extension, "yml");
        assert!(config.paths.is_empty());
        assert_eq!(config.lock.on_timeout, OnTimeout::Block);
    }

    #[test]
    fn test_load_written_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = PresetConfig::with_paths([("beamline", dir.path().join("bl"))]);
        config.lock.on_timeout = OnTimeout::Abandon;
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.paths, config.paths);
        assert_eq!(loaded.lock.on_timeout, OnTimeout::Abandon);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("none.toml"))).unwrap();
        assert!(loaded.paths.is_empty());
    }

    #[test]
    fn test_unparseable_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[paths\n").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(PresetError::Config { .. })
        ));
    }

    #[test]
    fn test_ensure_config_exists_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(ensure_config_exists(&path).unwrap());
        fs::write(&path, "extension = \"yaml\"\n").unwrap();
        assert!(!ensure_config_exists(&path).unwrap());
        assert_eq!(load_config(Some(&path)).unwrap().extension, "yaml");
    }
}
