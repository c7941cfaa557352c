//! Traits the pipeline depends on: network collaborators and the result store.
//!
//! All collaborators are optional at runtime: the orchestrator branches on
//! presence (`Option<&dyn ...>`) rather than catching missing-configuration
//! errors.

pub mod collaborators;
pub mod store;

pub use collaborators::{
    LlmConfidenceReport, LlmExtraction, LlmExtractor, LlmUnitRecord, OcrOutcome, OcrPageResult,
    OcrProvider, OcrTable, PropertyRecord, PropertyRecords,
};
pub use store::ResultStore;
