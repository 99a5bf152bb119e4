//! Preset store for one owning device.
//!
//! The store owns the in-memory cache of every configured category and the
//! table of installed accessors. Mutations go through [`PresetStore::update`],
//! which locks the document, rewrites it, and then re-syncs the whole cache.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::RwLock;

use crate::domain::{
    Document, MoveStatus, Mover, PresetConfig, PresetError, PresetRecord, Result,
};
use crate::infrastructure::{LockManager, StorageBackend};

use super::accessors::{AccessorRegistry, Operation, Target};
use super::position::PresetPosition;
use super::state::{nearest_state, PresetState, STATE_THRESHOLD};

/// How an update ended, given that it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The document was rewritten and the cache re-synced.
    Applied,
    /// The lock was unavailable; nothing was written and the cache is as
    /// it was.
    Abandoned,
}

/// Reject empty preset names.
///
/// # Errors
/// Returns `Validation` for an empty or blank name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PresetError::validation("preset name must be a non-empty string"));
    }
    Ok(())
}

/// Reject values that are not real numbers.
///
/// # Errors
/// Returns `Validation` for NaN or infinite values.
pub fn validate_value(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PresetError::validation(format!(
            "preset value must be a real number, not {value}"
        )));
    }
    Ok(())
}

/// Parse a user-supplied preset value.
///
/// # Errors
/// Returns `Validation` if `raw` is not a finite number.
pub fn parse_value(raw: &str) -> Result<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        PresetError::validation(format!("preset value must be a real number, not '{raw}'"))
    })?;
    validate_value(value)?;
    Ok(value)
}

fn log_lock_error(store: &str, err: &PresetError) {
    tracing::error!(
        store,
        "Unable to acquire file lock for {store}. File may be being edited by another user."
    );
    tracing::debug!(error = %err, "lock failure detail");
}

struct Inner {
    storage: StorageBackend,
    locks: LockManager,
    cache: BTreeMap<String, Document>,
    registry: AccessorRegistry,
}

impl Inner {
    fn new(owner: &str, config: PresetConfig) -> Self {
        Self {
            locks: LockManager::new(config.lock.clone()),
            storage: StorageBackend::new(owner, config),
            cache: BTreeMap::new(),
            registry: AccessorRegistry::new(),
        }
    }

    fn categories(&self) -> Vec<String> {
        self.storage
            .config()
            .categories()
            .map(str::to_string)
            .collect()
    }

    /// `None` when the document vanished before it could be opened.
    fn read_document(&self, category: &str) -> Result<Option<Document>> {
        let path = self.storage.path(category)?;
        let guard = match self.locks.with_lock(&path) {
            Ok(guard) => guard,
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %path.display(), "preset file removed before read");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.storage.read(&guard).map(Some)
    }

    fn write_document(&self, category: &str, document: &Document) -> Result<()> {
        let path = self.storage.path(category)?;
        let guard = self.locks.with_lock(&path)?;
        self.storage.write(&guard, document)
    }

    fn apply_update(
        &self,
        category: &str,
        name: &str,
        value: Option<f64>,
        comment: Option<&str>,
        active: bool,
    ) -> Result<()> {
        let missing = || PresetError::MissingRecord {
            category: category.to_string(),
            name: name.to_string(),
        };

        let path = self.storage.path(category)?;
        self.storage.create(category)?;

        // Held across the read-modify-write; the nested acquisitions in
        // read_document/write_document reuse it.
        let _guard = match self.locks.with_lock(&path) {
            Err(e) if e.is_not_found() => {
                self.storage.create(category)?;
                self.locks.with_lock(&path)?
            }
            guard => guard?,
        };
        let mut document = self.read_document(category)?.unwrap_or_default();

        let value = match (value, comment) {
            (None, Some(_)) => Some(document.get(name).map(|r| r.value).ok_or_else(missing)?),
            (value, _) => value,
        };

        if let Some(value) = value {
            document
                .entry(name.to_string())
                .or_insert_with(|| PresetRecord::new(value))
                .set_value(value, comment, Local::now());
        }

        document.get_mut(name).ok_or_else(missing)?.active = active;

        self.write_document(category, &document)?;
        tracing::info!(
            owner = %self.storage.owner(),
            category,
            name,
            value,
            active,
            "preset updated"
        );
        Ok(())
    }

    fn sync(&mut self, store: &str) -> Result<()> {
        self.registry.remove_all();
        self.cache = BTreeMap::new();

        let categories = self.categories();
        let mut cache = BTreeMap::new();
        tracing::debug!(store, "filling cache");

        for category in &categories {
            if !self.storage.exists(category)? {
                tracing::debug!(category = %category, owner = %self.storage.owner(), "no preset file");
                continue;
            }
            match self.read_document(category) {
                Ok(Some(document)) => {
                    cache.insert(category.clone(), document);
                }
                Ok(None) => {}
                Err(e) if e.is_lock_unavailable() => log_lock_error(store, &e),
                Err(e) => return Err(e),
            }
        }

        self.cache = cache;
        self.install_accessors(&categories);
        tracing::debug!(store, accessors = self.registry.len(), "installed accessors");
        Ok(())
    }

    fn install_accessors(&mut self, categories: &[String]) {
        for category in categories {
            self.registry.register(Operation::AddPreset {
                category: category.clone(),
            });
            self.registry.register(Operation::AddPresetHere {
                category: category.clone(),
            });
        }

        for (category, document) in &self.cache {
            for (name, _) in document.iter().filter(|(_, r)| r.active) {
                self.registry.register(Operation::MoveTo {
                    category: category.clone(),
                    name: name.clone(),
                });
                self.registry.register(Operation::MoveToAndWait {
                    category: category.clone(),
                    name: name.clone(),
                });
                self.registry.register(Operation::OffsetFrom {
                    category: category.clone(),
                    name: name.clone(),
                });
            }
        }
    }

    fn preset_value(&self, operation: &Operation) -> Result<f64> {
        let category = operation.category();
        let name = operation.preset().unwrap_or_default();
        self.cache
            .get(category)
            .and_then(|doc| doc.get(name))
            .map(|record| record.value)
            .ok_or_else(|| PresetError::MissingRecord {
                category: category.to_string(),
                name: name.to_string(),
            })
    }
}

/// Manager for the preset positions of one device.
pub struct PresetStore {
    name: String,
    mover: Arc<dyn Mover>,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for PresetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetStore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PresetStore {
    /// Bind a store to `mover` and load its presets.
    ///
    /// # Errors
    /// Returns `Load` if an existing document is corrupt.
    pub fn new(mover: Arc<dyn Mover>, config: PresetConfig) -> Result<Self> {
        let inner = Inner::new(mover.name(), config);
        let store = Self {
            name: format!("{}_presets", mover.name()),
            mover,
            inner: RwLock::new(inner),
        };
        store.sync()?;
        Ok(store)
    }

    /// Store name, `<device>_presets`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning mover.
    #[must_use]
    pub fn mover(&self) -> &Arc<dyn Mover> {
        &self.mover
    }

    /// Snapshot of the active configuration.
    #[must_use]
    pub fn config(&self) -> PresetConfig {
        self.inner.read().storage.config().clone()
    }

    /// Configured categories.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.inner.read().categories()
    }

    /// Reload every document and rebuild the accessor table.
    ///
    /// Categories without a document are skipped, including documents
    /// removed while the sync runs; a document that is locked elsewhere is
    /// logged and skipped.
    ///
    /// # Errors
    /// Returns `Load` if a document exists but is corrupt, leaving the
    /// cache and accessor table empty.
    pub fn sync(&self) -> Result<()> {
        tracing::debug!(store = %self.name, "call presets.sync()");
        self.inner.write().sync(&self.name)
    }

    /// Point the store at a new configuration and re-sync.
    ///
    /// # Errors
    /// See [`PresetStore::sync`].
    pub fn reconfigure(&self, config: PresetConfig) -> Result<()> {
        {
            let mut inner = self.inner.write();
            inner.locks = LockManager::new(config.lock.clone());
            inner.storage = StorageBackend::new(self.mover.name(), config);
        }
        self.sync()
    }

    /// Create or modify a preset, then re-sync.
    ///
    /// With no `value` but a `comment`, the existing value is re-recorded
    /// with the new comment. With neither, only the active flag changes.
    /// If the document lock cannot be obtained the update is abandoned
    /// and logged rather than returned as an error.
    ///
    /// # Errors
    /// Returns `Validation` before any I/O for a bad name or value,
    /// `UnknownCategory` for an unconfigured category, `MissingRecord` when
    /// there is no value to work from, and `Load`/`Io` for storage failures.
    pub fn update(
        &self,
        category: &str,
        name: &str,
        value: Option<f64>,
        comment: Option<&str>,
        active: bool,
    ) -> Result<UpdateOutcome> {
        tracing::debug!(
            store = %self.name,
            category,
            name,
            value,
            comment,
            active,
            "call presets.update()"
        );
        validate_name(name)?;
        if let Some(value) = value {
            validate_value(value)?;
        }

        let applied = self
            .inner
            .read()
            .apply_update(category, name, value, comment, active);

        match applied {
            Ok(()) => {}
            Err(e) if e.is_lock_unavailable() => {
                log_lock_error(&self.name, &e);
                return Ok(UpdateOutcome::Abandoned);
            }
            Err(e) => return Err(e),
        }

        self.sync()?;
        Ok(UpdateOutcome::Applied)
    }

    fn operation(&self, target: Target, accessor: &str) -> Result<Operation> {
        self.inner
            .read()
            .registry
            .get(target, accessor)
            .map(|a| a.operation.clone())
            .ok_or_else(|| PresetError::UnknownAccessor {
                name: accessor.to_string(),
            })
    }

    /// `add_<category>`: save a preset of `category`.
    ///
    /// # Errors
    /// Returns `UnknownAccessor` if the category is not configured, plus
    /// everything [`PresetStore::update`] returns.
    pub fn add(
        &self,
        category: &str,
        name: &str,
        value: f64,
        comment: Option<&str>,
    ) -> Result<UpdateOutcome> {
        let operation = self.operation(Target::Store, &format!("add_{category}"))?;
        self.update(operation.category(), name, Some(value), comment, true)
    }

    /// `add_here_<category>`: save the mover's current position.
    ///
    /// # Errors
    /// As [`PresetStore::add`], plus mover readback failures.
    pub fn add_here(&self, category: &str, name: &str, comment: Option<&str>) -> Result<UpdateOutcome> {
        let operation = self.operation(Target::Store, &format!("add_here_{category}"))?;
        let position = self.mover.position()?;
        self.add(operation.category(), name, position, comment)
    }

    /// `mv_<preset>`: move to the preset.
    ///
    /// # Errors
    /// Returns `UnknownAccessor` for unknown or inactive presets and the
    /// mover's error if the move fails.
    pub fn mv(&self, preset: &str, timeout: Option<Duration>, wait: bool) -> Result<MoveStatus> {
        let operation = self.operation(Target::Mover, &format!("mv_{preset}"))?;
        let target = self.inner.read().preset_value(&operation)?;
        tracing::info!(device = %self.mover.name(), preset, target, "move to preset");
        self.mover.move_to(target, timeout, wait)
    }

    /// `umv_<preset>`: move to the preset and wait for completion.
    ///
    /// # Errors
    /// As [`PresetStore::mv`].
    pub fn umv(&self, preset: &str, timeout: Option<Duration>) -> Result<MoveStatus> {
        let operation = self.operation(Target::Mover, &format!("umv_{preset}"))?;
        let target = self.inner.read().preset_value(&operation)?;
        tracing::info!(device = %self.mover.name(), preset, target, "move to preset and wait");
        self.mover.move_to(target, timeout, true)
    }

    /// `wm_<preset>`: preset value minus current position.
    ///
    /// Positive means the preset lies in the positive direction.
    ///
    /// # Errors
    /// Returns `UnknownAccessor` for unknown or inactive presets and the
    /// mover's error if the position cannot be read.
    pub fn wm(&self, preset: &str) -> Result<f64> {
        let operation = self.operation(Target::Mover, &format!("wm_{preset}"))?;
        let value = self.inner.read().preset_value(&operation)?;
        Ok(value - self.mover.position()?)
    }

    /// The active preset the mover is at, or `Unknown`.
    ///
    /// # Errors
    /// Returns the mover's error if the position cannot be read.
    pub fn state(&self) -> Result<PresetState> {
        let presets: Vec<(String, f64)> = {
            let inner = self.inner.read();
            inner
                .registry
                .offsets()
                .filter_map(|op| {
                    let value = inner.preset_value(op).ok()?;
                    Some((op.preset()?.to_string(), value))
                })
                .collect()
        };

        let position = self.mover.position()?;
        Ok(nearest_state(
            presets
                .iter()
                .map(|(name, value)| (name.as_str(), value - position)),
            STATE_THRESHOLD,
        ))
    }

    /// Whether any active preset is installed.
    #[must_use]
    pub fn has_presets(&self) -> bool {
        self.inner.read().registry.offsets().next().is_some()
    }

    /// Handles for every active preset, in registration order.
    #[must_use]
    pub fn positions(&self) -> Vec<PresetPosition<'_>> {
        self.inner
            .read()
            .registry
            .offsets()
            .filter_map(|op| Some(PresetPosition::new(self, op.category(), op.preset()?)))
            .collect()
    }

    /// Handle for an active preset by name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<PresetPosition<'_>> {
        let operation = self.operation(Target::Mover, &format!("wm_{name}")).ok()?;
        Some(PresetPosition::new(self, operation.category(), name))
    }

    /// Handle for any preset, active or not.
    #[must_use]
    pub fn handle(&self, category: &str, name: &str) -> PresetPosition<'_> {
        PresetPosition::new(self, category, name)
    }

    /// First cached category holding a preset called `name`.
    #[must_use]
    pub fn find_category(&self, name: &str) -> Option<String> {
        self.inner
            .read()
            .cache
            .iter()
            .find(|(_, doc)| doc.contains_key(name))
            .map(|(category, _)| category.clone())
    }

    /// Cached record, as of the last sync.
    #[must_use]
    pub fn record(&self, category: &str, name: &str) -> Option<PresetRecord> {
        self.inner
            .read()
            .cache
            .get(category)
            .and_then(|doc| doc.get(name))
            .cloned()
    }

    /// Cached document, as of the last sync.
    #[must_use]
    pub fn document(&self, category: &str) -> Option<Document> {
        self.inner.read().cache.get(category).cloned()
    }

    /// Document path for a category.
    ///
    /// # Errors
    /// Returns `UnknownCategory` if the category is not configured.
    pub fn storage_path(&self, category: &str) -> Result<PathBuf> {
        self.inner.read().storage.path(category)
    }

    /// Accessor names installed on `target`.
    #[must_use]
    pub fn accessor_names(&self, target: Target) -> Vec<String> {
        self.inner
            .read()
            .registry
            .names(target)
            .map(str::to_string)
            .collect()
    }
}

/// Re-point every store at `config` and re-sync each.
///
/// # Errors
/// Stops at the first store whose sync fails.
pub fn reconfigure(stores: &[&PresetStore], config: &PresetConfig) -> Result<()> {
    for store in stores {
        store.reconfigure(config.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{config_in, store_in, TestMover};
    use crate::domain::{LockConfig, OnTimeout};
    use nix::fcntl::{Flock, FlockArg};
    use std::fs::{self, OpenOptions};
    use std::thread;
    use tempfile::tempdir;

    fn abandoning() -> LockConfig {
        LockConfig {
            timeout_secs: 0.05,
            on_timeout: OnTimeout::Abandon,
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());

        let outcome = store.update("beamline", "n", Some(1.0), None, true).unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);
        store.sync().unwrap();

        let position = store.position("n").unwrap();
        assert_eq!(position.current_value().unwrap(), 1.0);
        assert_eq!(position.history().unwrap().len(), 1);
    }

    #[test]
    fn test_history_appends_in_call_order() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());

        store.update("beamline", "n", Some(1.0), Some("first"), true).unwrap();
        let first = store.record("beamline", "n").unwrap().history;
        store.update("beamline", "n", Some(2.0), None, true).unwrap();

        let history = store.record("beamline", "n").unwrap().history;
        let notes: Vec<_> = history.iter().map(|e| e.note.as_str()).collect();
        assert_eq!(notes, vec!["    1.0000 first", "    2.0000"]);
        assert_eq!(history.iter().next(), first.iter().next());
        assert_eq!(store.record("beamline", "n").unwrap().value, 2.0);
    }

    #[test]
    fn test_deactivate_then_reactivate() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());
        store.update("beamline", "n", Some(1.0), None, true).unwrap();
        assert!(store.accessor_names(Target::Mover).contains(&"wm_n".to_string()));

        store.update("beamline", "n", None, None, false).unwrap();
        let mover_ops = store.accessor_names(Target::Mover);
        for op in ["mv_n", "umv_n", "wm_n"] {
            assert!(!mover_ops.contains(&op.to_string()));
        }
        assert!(store.record("beamline", "n").is_some());
        assert!(!store.has_presets());

        store.update("beamline", "n", None, None, true).unwrap();
        let mover_ops = store.accessor_names(Target::Mover);
        assert_eq!(mover_ops, vec!["mv_n", "umv_n", "wm_n"]);
        assert_eq!(store.record("beamline", "n").unwrap().history.len(), 1);
    }

    #[test]
    fn test_validation_happens_before_io() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());

        let err = store.update("beamline", "", Some(1.0), None, true).unwrap_err();
        assert!(matches!(err, PresetError::Validation { .. }));
        assert!(!store.storage_path("beamline").unwrap().exists());

        let err = store
            .update("beamline", "n", Some(f64::NAN), None, true)
            .unwrap_err();
        assert!(matches!(err, PresetError::Validation { .. }));
        assert!(matches!(parse_value("x"), Err(PresetError::Validation { .. })));
        assert!(matches!(parse_value("inf"), Err(PresetError::Validation { .. })));
        assert_eq!(parse_value(" 2.5 ").unwrap(), 2.5);
    }

    #[test]
    fn test_unknown_category() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());

        let err = store.update("nope", "n", Some(1.0), None, true).unwrap_err();
        assert!(matches!(err, PresetError::UnknownCategory { .. }));
        let err = store.add("nope", "n", 1.0, None).unwrap_err();
        assert!(matches!(err, PresetError::UnknownAccessor { .. }));
    }

    #[test]
    fn test_contention_abandons_cleanly() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), abandoning());
        store.update("beamline", "n", Some(1.0), None, true).unwrap();
        let path = store.storage_path("beamline").unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let held = Flock::lock(file, FlockArg::LockExclusiveNonblock)
            .map_err(|(_, e)| e)
            .unwrap();

        let outcome = store.update("beamline", "n", Some(5.0), None, true).unwrap();
        assert_eq!(outcome, UpdateOutcome::Abandoned);
        assert_eq!(store.record("beamline", "n").unwrap().value, 1.0);
        assert!(store.position("n").is_some());

        drop(held);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_comment_only_update() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());
        store.update("user", "n", Some(3.0), None, true).unwrap();

        store.update("user", "n", None, Some("checked"), true).unwrap();
        let record = store.record("user", "n").unwrap();
        assert_eq!(record.value, 3.0);
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history.last().unwrap().note, "    3.0000 checked");

        let err = store
            .update("user", "ghost", None, Some("hello"), true)
            .unwrap_err();
        assert!(matches!(err, PresetError::MissingRecord { .. }));
        let err = store.update("user", "ghost", None, None, false).unwrap_err();
        assert!(matches!(err, PresetError::MissingRecord { .. }));
    }

    #[test]
    fn test_sync_skips_missing_and_rejects_corrupt() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());
        assert!(store.document("beamline").is_none());
        assert_eq!(
            store.accessor_names(Target::Store),
            vec!["add_beamline", "add_here_beamline", "add_user", "add_here_user"]
        );

        store.update("beamline", "n", Some(1.0), None, true).unwrap();
        assert!(store.document("beamline").is_some());
        assert!(store.document("user").is_none());

        let user = store.storage_path("user").unwrap();
        fs::create_dir_all(user.parent().unwrap()).unwrap();
        fs::write(&user, "n: [1, 2\n").unwrap();
        let err = store.sync().unwrap_err();
        assert!(matches!(err, PresetError::Load { .. }));
        assert!(store.document("beamline").is_none());
    }

    #[test]
    fn test_removed_document_reads_as_absent() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());
        store.update("beamline", "n", Some(1.0), None, true).unwrap();
        store.update("user", "u", Some(2.0), None, true).unwrap();

        let path = store.storage_path("beamline").unwrap();
        fs::remove_file(&path).unwrap();
        let inner = store.inner.read();
        assert!(inner.read_document("beamline").unwrap().is_none());
        assert!(inner.read_document("user").unwrap().is_some());
        drop(inner);

        store.sync().unwrap();
        assert!(store.document("beamline").is_none());
        assert!(store.position("n").is_none());
        assert_eq!(store.record("user", "u").unwrap().value, 2.0);

        store.update("beamline", "n", Some(3.0), None, true).unwrap();
        assert_eq!(store.record("beamline", "n").unwrap().value, 3.0);
        assert_eq!(store.record("beamline", "n").unwrap().history.len(), 1);
    }

    #[test]
    fn test_concurrent_updates_on_one_store() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());

        thread::scope(|s| {
            for t in 0..4 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..10 {
                        let name = format!("t{t}_{i}");
                        let outcome = store
                            .update("beamline", &name, Some(f64::from(t * 10 + i)), None, true)
                            .unwrap();
                        assert_eq!(outcome, UpdateOutcome::Applied);
                    }
                });
            }
        });

        store.sync().unwrap();
        let document = store.document("beamline").unwrap();
        assert_eq!(document.len(), 40);
        assert_eq!(document["t3_9"].value, 39.0);

        let raw = fs::read_to_string(store.storage_path("beamline").unwrap()).unwrap();
        let on_disk: Document = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(on_disk, document);
    }

    #[test]
    fn test_interleaved_stores_share_one_document() {
        let dir = tempdir().unwrap();
        let (_, first) = store_in(dir.path(), LockConfig::default());
        let (_, second) = store_in(dir.path(), LockConfig::default());

        thread::scope(|s| {
            for (prefix, store) in [("a", &first), ("b", &second)] {
                s.spawn(move || {
                    for i in 0..10 {
                        let name = format!("{prefix}{i}");
                        store.update("user", &name, Some(1.0), Some(prefix), true).unwrap();
                        store.update("user", &name, Some(2.0), None, true).unwrap();
                    }
                });
            }
        });

        first.sync().unwrap();
        second.sync().unwrap();
        for store in [&first, &second] {
            let document = store.document("user").unwrap();
            assert_eq!(document.len(), 20);
            assert!(document.values().all(|r| r.value == 2.0 && r.history.len() == 2));
        }
    }

    #[test]
    fn test_cache_is_stale_until_sync() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());
        store.update("beamline", "n", Some(1.0), None, true).unwrap();

        let other = PresetStore::new(TestMover::new("x_motor"), config_in(dir.path(), LockConfig::default()))
            .unwrap();
        other.update("beamline", "n", Some(7.0), None, true).unwrap();

        assert_eq!(store.record("beamline", "n").unwrap().value, 1.0);
        store.sync().unwrap();
        assert_eq!(store.record("beamline", "n").unwrap().value, 7.0);
    }

    #[test]
    fn test_move_accessors() {
        let dir = tempdir().unwrap();
        let (mover, store) = store_in(dir.path(), LockConfig::default());
        store.add("beamline", "in", 4.0, None).unwrap();
        mover.set(1.5);

        assert_eq!(store.wm("in").unwrap(), 2.5);

        store.mv("in", Some(Duration::from_secs(2)), false).unwrap();
        store.umv("in", None).unwrap();
        let moves = mover.moves.lock().clone();
        assert_eq!(
            moves,
            vec![(4.0, Some(Duration::from_secs(2)), false), (4.0, None, true)]
        );

        assert!(matches!(
            store.mv("out", None, false),
            Err(PresetError::UnknownAccessor { .. })
        ));
    }

    #[test]
    fn test_add_here_uses_mover_position() {
        let dir = tempdir().unwrap();
        let (mover, store) = store_in(dir.path(), LockConfig::default());
        mover.set(-3.25);

        store.add_here("user", "park", Some("parked")).unwrap();
        let record = store.record("user", "park").unwrap();
        assert_eq!(record.value, -3.25);
        assert_eq!(record.history.last().unwrap().note, "   -3.2500 parked");
    }

    #[test]
    fn test_state_selection() {
        let dir = tempdir().unwrap();
        let (mover, store) = store_in(dir.path(), LockConfig::default());
        store.add("beamline", "a", 10.0, None).unwrap();
        store.add("beamline", "b", 10.3, None).unwrap();

        mover.set(10.2);
        assert_eq!(store.state().unwrap(), PresetState::At("b".into()));
        mover.set(20.0);
        assert_eq!(store.state().unwrap(), PresetState::Unknown);
    }

    #[test]
    fn test_reconfigure_all_stores() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        let (_, x) = store_in(&first, LockConfig::default());
        let y = PresetStore::new(TestMover::new("y_motor"), config_in(&first, LockConfig::default()))
            .unwrap();
        x.add("beamline", "a", 1.0, None).unwrap();

        let (_, seed) = store_in(&second, LockConfig::default());
        seed.add("beamline", "b", 2.0, None).unwrap();

        reconfigure(&[&x, &y], &config_in(&second, LockConfig::default())).unwrap();
        assert!(x.position("a").is_none());
        assert_eq!(x.position("b").unwrap().current_value().unwrap(), 2.0);
        assert!(!y.has_presets());
    }

    #[test]
    fn test_positions_listing() {
        let dir = tempdir().unwrap();
        let (_, store) = store_in(dir.path(), LockConfig::default());
        store.add("beamline", "in", 1.0, None).unwrap();
        store.add("user", "out", 2.0, None).unwrap();

        let names: Vec<_> = store
            .positions()
            .iter()
            .map(|p| format!("{}/{}", p.category(), p.name()))
            .collect();
        assert_eq!(names, vec!["beamline/in", "user/out"]);
        assert_eq!(store.find_category("out").as_deref(), Some("user"));
        assert_eq!(store.name(), "x_motor_presets");
    }
}
