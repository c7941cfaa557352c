//! # planfact-extract
//!
//! The extraction and reconciliation pipeline for architectural-plan
//! documents. Turns raw permit-submission bytes into confidence-scored,
//! evidence-backed project facts: ingestion, OCR escalation and repair,
//! table reconstruction and classification, independent signal extractors,
//! page relevance, resolution, validation gates, and LLM reconciliation.

pub mod extractors;
pub mod ingest;
pub mod ocr;
pub mod pipeline;
pub mod relevance;
pub mod reconcile;
pub mod resolve;
pub mod tables;
pub mod validate;

pub use pipeline::{DocumentInput, Pipeline, RunOptions};
