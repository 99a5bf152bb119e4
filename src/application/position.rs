//! Handle on a single named preset.

use std::fmt;
use std::path::PathBuf;

use crate::domain::{History, PresetError, PresetRecord, Result};

use super::store::{PresetStore, UpdateOutcome};

/// A reference to one preset of one category.
///
/// Reads come from the store's cache, so they reflect the last sync.
/// Every mutation re-syncs the store.
#[derive(Clone)]
pub struct PresetPosition<'a> {
    store: &'a PresetStore,
    category: String,
    name: String,
}

impl<'a> PresetPosition<'a> {
    pub(crate) fn new(store: &'a PresetStore, category: &str, name: &str) -> Self {
        Self {
            store,
            category: category.to_string(),
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Full cached record.
    ///
    /// # Errors
    /// Returns `MissingRecord` if the preset is not in the cache.
    pub fn info(&self) -> Result<PresetRecord> {
        self.store
            .record(&self.category, &self.name)
            .ok_or_else(|| PresetError::MissingRecord {
                category: self.category.clone(),
                name: self.name.clone(),
            })
    }

    /// Saved position.
    ///
    /// # Errors
    /// Returns `MissingRecord` if the preset is not in the cache.
    pub fn current_value(&self) -> Result<f64> {
        self.info().map(|r| r.value)
    }

    /// Recorded history.
    ///
    /// # Errors
    /// Returns `MissingRecord` if the preset is not in the cache.
    pub fn history(&self) -> Result<History> {
        self.info().map(|r| r.history)
    }

    /// File that defines this preset.
    ///
    /// # Errors
    /// Returns `UnknownCategory` if the category is no longer configured.
    pub fn storage_path(&self) -> Result<PathBuf> {
        self.store.storage_path(&self.category)
    }

    /// Save a new value, defaulting to the mover's current position.
    ///
    /// # Errors
    /// See [`PresetStore::update`].
    pub fn update(&self, new_value: Option<f64>, comment: Option<&str>) -> Result<UpdateOutcome> {
        let value = match new_value {
            Some(value) => value,
            None => self.store.mover().position()?,
        };
        self.store
            .update(&self.category, &self.name, Some(value), comment, true)
    }

    /// Re-record the current value with a new comment.
    ///
    /// # Errors
    /// See [`PresetStore::update`].
    pub fn update_comment(&self, comment: &str) -> Result<UpdateOutcome> {
        self.store
            .update(&self.category, &self.name, None, Some(comment), true)
    }

    /// Hide the preset's accessors. History is kept and the preset can be
    /// re-activated.
    ///
    /// # Errors
    /// See [`PresetStore::update`].
    pub fn deactivate(&self) -> Result<UpdateOutcome> {
        self.store
            .update(&self.category, &self.name, None, None, false)
    }
}

impl fmt::Debug for PresetPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetPosition")
            .field("category", &self.category)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for PresetPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current_value() {
            Ok(value) => write!(f, "{value}"),
            Err(_) => write!(f, "<missing>"),
        }
    }
}
