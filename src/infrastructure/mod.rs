//! Infrastructure layer - external adapters (locks, files, axes).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod lock;
pub mod storage;
pub mod virtual_axis;

pub use config::{ensure_config_exists, load_config};
pub use lock::{LockGuard, LockManager};
pub use storage::StorageBackend;
pub use virtual_axis::VirtualAxis;
