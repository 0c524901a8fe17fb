//! Cooperative shutdown flag shared by the bridge workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set once, never cleared. Workers check it at the top of every loop turn
/// and after every bounded wait.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
