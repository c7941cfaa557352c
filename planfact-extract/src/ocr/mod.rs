//! OCR escalation and deterministic post-processing of OCR text.

pub mod escalate;
pub mod postprocess;

pub use escalate::{OcrEscalation, OcrStageReport};
pub use postprocess::OcrPostProcessor;
