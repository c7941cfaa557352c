//! Signals, evidence, and mentions: the units of trust in the pipeline.
//!
//! A `Signal` is a value someone derived, with justification. Extractors and
//! the resolver only ever produce or consume signals, never bare values; a
//! signal with no evidence cannot be constructed.

use serde::{Deserialize, Serialize};

use super::table::TableType;

/// Where a piece of evidence (or a mention) came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    CoverSheet,
    ZoningText,
    Table,
    Ocr,
    Llm,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoverSheet => "cover_sheet",
            Self::ZoningText => "zoning_text",
            Self::Table => "table",
            Self::Ocr => "ocr",
            Self::Llm => "llm",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located, quoted excerpt justifying a signal's value. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Zero-based page index the snippet was found on.
    pub page: usize,
    /// Quoted excerpt surrounding the match.
    pub snippet: String,
    pub source: SourceType,
    pub confidence: f32,
    /// Set when the evidence comes from a classified table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_type: Option<TableType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_index: Option<usize>,
}

impl Evidence {
    /// Evidence from running text on a page.
    pub fn from_text(page: usize, snippet: impl Into<String>, source: SourceType, confidence: f32) -> Self {
        Self {
            page,
            snippet: snippet.into(),
            source,
            confidence,
            table_type: None,
            table_index: None,
        }
    }

    /// Evidence from a classified table.
    pub fn from_table(
        page: usize,
        snippet: impl Into<String>,
        confidence: f32,
        table_type: TableType,
        table_index: usize,
    ) -> Self {
        Self {
            page,
            snippet: snippet.into(),
            source: SourceType::Table,
            confidence,
            table_type: Some(table_type),
            table_index: Some(table_index),
        }
    }
}

/// A confidence-scored value with its evidence trail.
///
/// Confidence is a probability-like score in [0, 1] used for relative ranking
/// and thresholding, not a calibrated probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal<T> {
    pub value: T,
    pub confidence: f32,
    /// Never empty: `Signal::new` requires at least one piece of evidence.
    pub evidence: Vec<Evidence>,
}

impl<T> Signal<T> {
    /// Create a signal backed by a single piece of evidence.
    pub fn new(value: T, confidence: f32, evidence: Evidence) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            evidence: vec![evidence],
        }
    }

    /// Attach further corroborating evidence.
    pub fn push_evidence(&mut self, evidence: Evidence) {
        self.evidence.push(evidence);
    }

    /// Replace the confidence, clamped to [0, 1].
    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    /// Map the value while keeping confidence and evidence.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Signal<U> {
        Signal {
            value: f(self.value),
            confidence: self.confidence,
            evidence: self.evidence,
        }
    }
}

/// A lightweight, evidence-light observation of a candidate unit count.
///
/// Mentions are never resolved values themselves; they exist to measure
/// cross-source agreement via the redundancy score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCountMention {
    pub value: u32,
    pub page: usize,
    pub source: SourceType,
    pub snippet: String,
    pub confidence: f32,
}
