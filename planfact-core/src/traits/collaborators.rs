//! Network collaborator contracts: cloud OCR, LLM extraction, property records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RemoteError;
use crate::types::page::PageText;

/// Per-page OCR output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPageResult {
    pub page: usize,
    pub text: String,
    pub lines: Vec<String>,
}

/// Table geometry as segmented by the OCR service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrTable {
    pub page: usize,
    pub header_rows: Vec<Vec<String>>,
    pub body_rows: Vec<Vec<String>>,
}

/// Everything one OCR call returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrOutcome {
    pub pages: Vec<OcrPageResult>,
    pub tables: Vec<OcrTable>,
}

/// Cloud OCR/layout collaborator.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Cheap availability probe made before any recognition call.
    async fn is_available(&self) -> bool;

    /// Recognize the given pages of a document.
    ///
    /// Returns `RemoteError::NotConfigured` when no provider is set up; the
    /// caller treats that as a non-fatal skip.
    async fn recognize(&self, document: &[u8], pages: &[usize]) -> Result<OcrOutcome, RemoteError>;
}

/// A per-unit record in the LLM extraction schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmUnitRecord {
    pub unit_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedroom_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
}

/// Which fields the model could not find, plus free-form warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfidenceReport {
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Fixed extraction schema returned by the language-model collaborator.
/// Every field is nullable; absence means "not found", never zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmExtraction {
    pub total_units: Option<u32>,
    pub studio_units: Option<u32>,
    pub one_br_units: Option<u32>,
    pub two_br_units: Option<u32>,
    pub three_plus_br_units: Option<u32>,
    #[serde(default)]
    pub units: Vec<LlmUnitRecord>,
    pub lot_area_sf: Option<f64>,
    pub floor_area_ratio: Option<f64>,
    pub zoning_district: Option<String>,
    pub floor_count: Option<u32>,
    #[serde(default)]
    pub confidence: LlmConfidenceReport,
}

impl LlmExtraction {
    /// Enforce the per-unit record sanity cap: the record list may not exceed
    /// the declared total unit count by more than `ratio` (e.g. 1.5 = 50%
    /// overshoot). Excess records are dropped deterministically in
    /// (floor, unit_id) order; records without a floor sort last.
    pub fn apply_record_cap(&mut self, ratio: f64) {
        let Some(declared) = self.total_units else {
            return;
        };
        let cap = (declared as f64 * ratio).floor() as usize;
        if self.units.len() <= cap {
            return;
        }
        self.units.sort_by(|a, b| {
            let fa = a.floor.unwrap_or(i32::MAX);
            let fb = b.floor.unwrap_or(i32::MAX);
            fa.cmp(&fb).then_with(|| a.unit_id.cmp(&b.unit_id))
        });
        self.units.truncate(cap);
        self.confidence
            .warnings
            .push(format!("unit record list capped at {cap} (declared total {declared})"));
    }
}

/// Language-model extraction collaborator.
#[async_trait]
pub trait LlmExtractor: Send + Sync {
    /// Extract the fixed schema from a bounded set of relevant pages,
    /// optionally grounded with authoritative reference data.
    async fn extract(
        &self,
        pages: &[PageText],
        reference: Option<&PropertyRecord>,
    ) -> Result<LlmExtraction, RemoteError>;
}

/// Authoritative property record used as validation ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub lot_area_sf: f64,
    pub resid_far: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bldg_area_sf: Option<f64>,
}

/// Property-record lookup collaborator.
#[async_trait]
pub trait PropertyRecords: Send + Sync {
    /// Look up the record for a parcel. `Ok(None)` means the parcel is
    /// unknown; dependent validation gates are then disabled.
    async fn lookup(&self, parcel_id: &str) -> Result<Option<PropertyRecord>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, floor: Option<i32>) -> LlmUnitRecord {
        LlmUnitRecord {
            unit_id: id.to_string(),
            bedroom_type: None,
            floor,
        }
    }

    #[test]
    fn record_cap_drops_by_floor_then_id() {
        let mut extraction = LlmExtraction {
            total_units: Some(2),
            units: vec![
                record("4B", Some(4)),
                record("1A", Some(1)),
                record("9Z", None),
                record("1B", Some(1)),
            ],
            ..Default::default()
        };
        extraction.apply_record_cap(1.5);
        // cap = floor(2 * 1.5) = 3; floorless record sorts last and is dropped
        let ids: Vec<_> = extraction.units.iter().map(|u| u.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["1A", "1B", "4B"]);
        assert_eq!(extraction.confidence.warnings.len(), 1);
    }

    #[test]
    fn record_cap_noop_without_declared_total() {
        let mut extraction = LlmExtraction {
            units: (0..10).map(|i| record(&format!("{i}A"), Some(i))).collect(),
            ..Default::default()
        };
        extraction.apply_record_cap(1.5);
        assert_eq!(extraction.units.len(), 10);
    }
}
