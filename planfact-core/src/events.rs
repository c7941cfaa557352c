//! Progress events emitted by the orchestrator.

/// A completed pipeline stage, reported to progress observers.
#[derive(Debug, Clone)]
pub struct StageEvent {
    /// Human-readable stage label, e.g. "ocr escalation".
    pub label: &'static str,
    /// Monotonically increasing completion percentage.
    pub percent: u8,
}

/// Observer interface for pipeline progress.
///
/// Implementations must be cheap: handlers run inline between stages.
pub trait ExtractEventHandler: Send + Sync {
    /// Called after each stage completes.
    fn on_stage(&self, event: &StageEvent);

    /// Called when a non-fatal condition is recorded (skipped collaborator,
    /// dropped candidate, cache failure).
    fn on_warning(&self, _message: &str) {}
}

/// Default no-op handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventHandler;

impl ExtractEventHandler for NullEventHandler {
    fn on_stage(&self, _event: &StageEvent) {}
}
