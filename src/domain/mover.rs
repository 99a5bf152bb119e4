//! The controllable axis a preset store is attached to.

use std::time::Duration;

use super::error::Result;

/// Outcome of a motion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStatus {
    /// Requested target.
    pub target: f64,
    /// Whether motion had completed when the call returned.
    pub done: bool,
}

/// External motion capability.
///
/// Implementations use interior mutability so a mover can be shared
/// between a store and its callers.
pub trait Mover: Send + Sync {
    /// Device identifier; also the stem of its preset documents.
    fn name(&self) -> &str;

    /// Current readback position.
    ///
    /// # Errors
    /// Returns error if the position cannot be read.
    fn position(&self) -> Result<f64>;

    /// Start a move to `target`, optionally waiting for completion.
    ///
    /// # Errors
    /// Returns `Move` if the request is rejected or does not finish in time.
    fn move_to(&self, target: f64, timeout: Option<Duration>, wait: bool) -> Result<MoveStatus>;
}
