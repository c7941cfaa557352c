//! LLM-reconciliation policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilePolicy {
    /// Count fields (units, floors) agree within this absolute distance.
    pub count_tolerance: u32,
    /// Area and ratio fields agree within this relative tolerance.
    pub relative_tolerance: f64,
    /// Confidence added on agreement, capped at 1.0.
    pub agreement_boost: f32,
    /// Fixed confidence for fields present only in the LLM output.
    pub llm_only_confidence: f32,
    /// Sanity cap: per-unit records may exceed the declared total by at most
    /// this ratio (1.5 = 50% overshoot).
    pub record_cap_ratio: f64,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            count_tolerance: 2,
            relative_tolerance: 0.05,
            agreement_boost: 0.1,
            llm_only_confidence: 0.7,
            record_cap_ratio: 1.5,
        }
    }
}
