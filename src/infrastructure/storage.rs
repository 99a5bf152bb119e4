//! Preset document storage.
//!
//! One YAML document per (owner, category). Reads and writes require a
//! [`LockGuard`] for the document, so they can only happen inside a lock
//! scope. Writes replace the whole file.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use crate::domain::{Document, PresetConfig, PresetError, Result};

use super::lock::LockGuard;

/// Mode for newly created documents so several operator accounts can share
/// one preset directory.
const SHARED_FILE_MODE: u32 = 0o666;

/// Reads and writes the documents of one owning device.
#[derive(Debug, Clone)]
pub struct StorageBackend {
    owner: String,
    config: PresetConfig,
}

impl StorageBackend {
    /// Create a backend for `owner` using the given category roots.
    #[must_use]
    pub fn new(owner: impl Into<String>, config: PresetConfig) -> Self {
        Self {
            owner: owner.into(),
            config,
        }
    }

    /// Owning device name.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &PresetConfig {
        &self.config
    }

    /// Document path for a category.
    ///
    /// # Errors
    /// Returns `UnknownCategory` if the category is not configured.
    pub fn path(&self, category: &str) -> Result<PathBuf> {
        let path = self.config.document_path(category, &self.owner)?;
        tracing::debug!(path = %path.display(), "select presets path");
        Ok(path)
    }

    /// Whether the category's document exists on disk.
    ///
    /// # Errors
    /// Returns `UnknownCategory` if the category is not configured.
    pub fn exists(&self, category: &str) -> Result<bool> {
        Ok(self.path(category)?.is_file())
    }

    /// Create an empty, group-shareable document if none exists yet.
    ///
    /// Returns `true` if a file was created.
    ///
    /// # Errors
    /// Returns `Io` if the directory or file cannot be created.
    pub fn create(&self, category: &str) -> Result<bool> {
        let path = self.path(category)?;
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PresetError::io("Failed to create preset directory", e))?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(PresetError::io(
                    format!("Failed to create {}", path.display()),
                    e,
                ))
            }
        }

        fs::set_permissions(&path, fs::Permissions::from_mode(SHARED_FILE_MODE))
            .map_err(|e| PresetError::io(format!("Failed to set mode on {}", path.display()), e))?;

        tracing::debug!(path = %path.display(), "created preset file");
        Ok(true)
    }

    /// Read the locked document. An empty file is an empty document.
    ///
    /// # Errors
    /// Returns `Io` on read failure and `Load` if the content is corrupt.
    pub fn read(&self, guard: &LockGuard) -> Result<Document> {
        tracing::debug!(owner = %self.owner, path = %guard.path().display(), "read presets");

        let mut file = guard.file();
        let mut content = String::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_string(&mut content))
            .map_err(|e| PresetError::io(format!("Failed to read {}", guard.path().display()), e))?;

        if content.trim().is_empty() {
            return Ok(Document::new());
        }

        serde_yaml::from_str::<Option<Document>>(&content)
            .map(Option::unwrap_or_default)
            .map_err(|e| PresetError::load(guard.path(), e))
    }

    /// Replace the locked document's entire content.
    ///
    /// # Errors
    /// Returns `Serialize` if the document cannot be encoded and `Io` if
    /// the file cannot be rewritten.
    pub fn write(&self, guard: &LockGuard, document: &Document) -> Result<()> {
        tracing::debug!(owner = %self.owner, path = %guard.path().display(), "write presets");

        let content = serde_yaml::to_string(document).map_err(PresetError::serialize)?;

        let mut file = guard.file();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.set_len(0))
            .and_then(|()| file.write_all(content.as_bytes()))
            .and_then(|()| file.flush())
            .map_err(|e| PresetError::io(format!("Failed to write {}", guard.path().display()), e))
    }
}
