//! Cross-process advisory locking for preset documents.
//!
//! Locks are `flock(2)` exclusive locks taken on the document itself.
//! Acquisition polls until a deadline, then either blocks indefinitely or
//! gives up, depending on [`OnTimeout`]. Locks are re-entrant per manager
//! and thread: asking again for a path the calling thread already holds
//! hands back the same lock. Other threads open their own descriptor and
//! contend through `flock` like any other process.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use parking_lot::Mutex;

use crate::domain::{LockConfig, OnTimeout, PresetError, Result};

/// Interval between non-blocking attempts during the bounded wait.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct HeldLock {
    path: PathBuf,
    file: Flock<File>,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        // The flock is released when `file` drops right after this.
        tracing::debug!(path = %self.path.display(), "released lock");
    }
}

/// Scoped handle on an exclusively locked document.
///
/// The lock is released when the last guard for the path is dropped,
/// including during unwinding.
#[derive(Clone)]
pub struct LockGuard {
    inner: Arc<HeldLock>,
}

impl LockGuard {
    /// The locked path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// The open, locked file.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.inner.file
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

/// Hands out exclusive document locks.
pub struct LockManager {
    config: LockConfig,
    held: Mutex<HashMap<(ThreadId, PathBuf), Weak<HeldLock>>>,
}

fn scope_key(path: &Path) -> (ThreadId, PathBuf) {
    (thread::current().id(), path.to_path_buf())
}

impl LockManager {
    /// Create a manager with the given lock policy.
    #[must_use]
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            held: Mutex::new(HashMap::new()),
        }
    }

    /// The active lock policy.
    #[must_use]
    pub const fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Whether the calling thread holds the lock on `path` through this
    /// manager.
    #[must_use]
    pub fn is_held(&self, path: &Path) -> bool {
        self.held
            .lock()
            .get(&scope_key(path))
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Lock `path` using the configured timeout.
    ///
    /// # Errors
    /// See [`LockManager::with_lock_timeout`].
    pub fn with_lock(&self, path: &Path) -> Result<LockGuard> {
        self.with_lock_timeout(path, self.config.timeout())
    }

    /// Lock `path`, waiting up to `timeout` before applying the
    /// `on_timeout` policy.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be opened (see
    /// [`PresetError::is_not_found`]) and `LockUnavailable` if
    /// the lock is refused outright, or is still busy after the wait under
    /// [`OnTimeout::Abandon`].
    pub fn with_lock_timeout(&self, path: &Path, timeout: Duration) -> Result<LockGuard> {
        let key = scope_key(path);
        if let Some(inner) = self.held.lock().get(&key).and_then(Weak::upgrade) {
            tracing::debug!(path = %path.display(), "using already held lock");
            return Ok(LockGuard { inner });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| PresetError::io(format!("Failed to open {}", path.display()), e))?;

        let flock = acquire(file, path, timeout, self.config.on_timeout)?;
        tracing::debug!(path = %path.display(), "acquired lock");

        let inner = Arc::new(HeldLock {
            path: path.to_path_buf(),
            file: flock,
        });

        let mut held = self.held.lock();
        held.retain(|_, weak| weak.strong_count() > 0);
        held.insert(key, Arc::downgrade(&inner));

        Ok(LockGuard { inner })
    }
}

fn unavailable(path: &Path, errno: Errno) -> PresetError {
    PresetError::LockUnavailable {
        path: path.to_path_buf(),
        source: Some(errno),
    }
}

fn acquire(
    mut file: File,
    path: &Path,
    timeout: Duration,
    on_timeout: OnTimeout,
) -> Result<Flock<File>> {
    let deadline = Instant::now() + timeout;

    loop {
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => return Ok(lock),
            Err((f, errno)) if errno == Errno::EWOULDBLOCK || errno == Errno::EINTR => {
                file = f;
            }
            Err((_, errno)) => return Err(unavailable(path, errno)),
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }

    match on_timeout {
        OnTimeout::Block => {
            tracing::warn!(
                path = %path.display(),
                timeout_ms = timeout.as_millis(),
                "lock still busy after timeout, blocking until released"
            );
            loop {
                match Flock::lock(file, FlockArg::LockExclusive) {
                    Ok(lock) => return Ok(lock),
                    Err((f, Errno::EINTR)) => file = f,
                    Err((_, errno)) => return Err(unavailable(path, errno)),
                }
            }
        }
        OnTimeout::Abandon => Flock::lock(file, FlockArg::LockExclusiveNonblock)
            .map_err(|(_, errno)| unavailable(path, errno)),
    }
}
