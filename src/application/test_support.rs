//! Shared fixtures for store and position tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::{LockConfig, MoveStatus, Mover, PresetConfig, Result};

use super::store::PresetStore;

/// In-memory mover that records every move request.
pub struct TestMover {
    name: String,
    position: Mutex<f64>,
    pub moves: Mutex<Vec<(f64, Option<Duration>, bool)>>,
}

impl TestMover {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            position: Mutex::new(0.0),
            moves: Mutex::new(Vec::new()),
        })
    }

    pub fn set(&self, position: f64) {
        *self.position.lock() = position;
    }
}

impl Mover for TestMover {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<f64> {
        Ok(*self.position.lock())
    }

    fn move_to(&self, target: f64, timeout: Option<Duration>, wait: bool) -> Result<MoveStatus> {
        self.moves.lock().push((target, timeout, wait));
        self.set(target);
        Ok(MoveStatus { target, done: wait })
    }
}

/// Config with `beamline` and `user` categories under `dir`.
pub fn config_in(dir: &Path, lock: LockConfig) -> PresetConfig {
    PresetConfig::with_paths([
        ("beamline", dir.join("beamline")),
        ("user", dir.join("user")),
    ])
    .with_lock(lock)
}

/// A store for a fresh `x_motor` test mover.
pub fn store_in(dir: &Path, lock: LockConfig) -> (Arc<TestMover>, PresetStore) {
    let mover = TestMover::new("x_motor");
    let store = PresetStore::new(mover.clone(), config_in(dir, lock)).unwrap();
    (mover, store)
}
