/*!
 Cooperative cancellation for export and import runs.

 Walkers and reconcilers poll the token at least once per record and stop
 cleanly, returning the totals accumulated so far. Cancellation is not an
 error and is never logged as one.
*/

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cloneable cancellation flag shared between a run and its controller
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the holder of this token stop at the next poll
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
