//! Cooperative cancellation for the pipeline.
//!
//! A single flag is threaded through the orchestrator and checked between
//! stages, never inside one. A cancelled run returns a fully-formed empty
//! result rather than throwing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation handle. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let cancel = Cancellation::new();
        let handle = cancel.clone();
        assert!(!handle.is_cancelled());
        cancel.cancel();
        assert!(handle.is_cancelled());
    }
}
