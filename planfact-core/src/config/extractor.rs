//! Signal-extractor policy: page-focus confidences and plausibility ranges.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorPolicy {
    /// Confidence of a match found on a semantically relevant page.
    pub focused_confidence: f32,
    /// Reduced confidence when the extractor had to fall back to the whole
    /// document.
    pub fallback_confidence: f32,
    /// Plausible dwelling-unit-count range, inclusive. Matches outside are
    /// rejected as "not found", never surfaced.
    pub min_units: u32,
    pub max_units: u32,
    /// Plausible floor-area-ratio range, inclusive.
    pub min_far: f64,
    pub max_far: f64,
}

impl Default for ExtractorPolicy {
    fn default() -> Self {
        Self {
            focused_confidence: 0.9,
            fallback_confidence: 0.7,
            min_units: 1,
            max_units: 500,
            min_far: 0.1,
            max_far: 15.0,
        }
    }
}

impl ExtractorPolicy {
    pub fn units_in_range(&self, value: u32) -> bool {
        value >= self.min_units && value <= self.max_units
    }

    pub fn far_in_range(&self, value: f64) -> bool {
        value >= self.min_far && value <= self.max_far
    }
}
