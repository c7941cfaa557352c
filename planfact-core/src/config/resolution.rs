//! Resolution and redundancy policy.

use serde::{Deserialize, Serialize};

/// Constants for merging independent unit-count signals into one value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    /// Source weight multiplied into a cover-sheet candidate's confidence.
    pub cover_sheet_weight: f32,
    /// Source weight for zoning-text candidates.
    pub zoning_text_weight: f32,
    /// Source weight for table-derived candidates.
    pub table_weight: f32,
    /// Ceiling applied when only a single candidate exists; one source is
    /// never trusted above this.
    pub single_source_cap: f32,
    /// Two candidates within this absolute distance count as agreeing.
    pub agreement_window: u32,
    /// Confidence added to each member of an agreeing pair.
    pub agreement_boost: f32,
    /// Outlier trigger: max candidate exceeds `outlier_ratio` × min candidate.
    pub outlier_ratio: f64,
    /// Outlier trigger: the min candidate is under this value.
    pub outlier_low_ceiling: u32,
    /// Confidence subtracted from the high outlier when both triggers fire.
    pub outlier_penalty: f32,
    /// Extra confidence when three or more sources corroborate the winner.
    pub corroboration_boost: f32,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            cover_sheet_weight: 0.9,
            zoning_text_weight: 0.85,
            table_weight: 0.8,
            single_source_cap: 0.6,
            agreement_window: 2,
            agreement_boost: 0.1,
            outlier_ratio: 2.0,
            outlier_low_ceiling: 30,
            outlier_penalty: 0.4,
            corroboration_boost: 0.05,
        }
    }
}

/// Tiered redundancy scores by count of distinct agreeing (source, page) pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedundancyPolicy {
    pub zero_sources: f32,
    pub one_source: f32,
    pub two_sources: f32,
    pub three_plus_sources: f32,
}

impl Default for RedundancyPolicy {
    fn default() -> Self {
        Self {
            zero_sources: 0.0,
            one_source: 0.6,
            two_sources: 0.85,
            three_plus_sources: 0.95,
        }
    }
}

impl RedundancyPolicy {
    /// Score for a given corroborating-source count. Monotonically
    /// non-decreasing in the count.
    pub fn score(&self, distinct_sources: usize) -> f32 {
        match distinct_sources {
            0 => self.zero_sources,
            1 => self.one_source,
            2 => self.two_sources,
            _ => self.three_plus_sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundancy_tiers_are_monotonic() {
        let policy = RedundancyPolicy::default();
        let scores: Vec<f32> = (0..6).map(|n| policy.score(n)).collect();
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[1], 0.6);
        assert_eq!(scores[2], 0.85);
        assert_eq!(scores[3], 0.95);
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    }
}
