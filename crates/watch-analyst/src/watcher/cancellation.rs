//! Stop signal for the watch loop.
//!
//! The Ctrl+C handler and the loop share one [`CancellationToken`]; the loop
//! checks it between events, so a file already being processed is finished
//! before the watcher returns.
//!
//! ```
//! use watch_analyst::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let handler_side = token.clone();
//! handler_side.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag requesting the watcher to stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Visible to every clone.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
