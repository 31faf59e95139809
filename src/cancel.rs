//! Cooperative cancellation flag shared across threads

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable flag that one side sets and the other side polls.
///
/// Used by the query bridge (caller sets, worker polls every N rows) and by
/// the visualization engine (one token handed to every registered listener,
/// triggered once on destroy).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns true only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
