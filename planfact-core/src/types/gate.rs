//! Validation gates: advisory cross-checks against authoritative city records.

use serde::{Deserialize, Serialize};

use super::signal::Evidence;

/// Which resolved field a gate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateField {
    UnitCount,
    FloorAreaRatio,
    LotArea,
    MentionAgreement,
}

impl GateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnitCount => "unit_count",
            Self::FloorAreaRatio => "floor_area_ratio",
            Self::LotArea => "lot_area",
            Self::MentionAgreement => "mention_agreement",
        }
    }
}

/// Escalating gate severity. Gates are annotations, never errors: the caller
/// decides whether a non-Pass status blocks or merely warns the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Pass,
    Warn,
    NeedsOverride,
    Conflicting,
}

/// One advisory cross-check result. Created once per applicable field per
/// run, never mutated afterward, and never mutates the underlying signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationGate {
    pub field: GateField,
    pub extracted_value: f64,
    /// (low, high) bounds the extracted value was checked against, if the
    /// gate is range-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_range: Option<(f64, f64)>,
    /// The authoritative reference value the range was derived from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_basis: Option<f64>,
    pub status: GateStatus,
    pub evidence: Vec<Evidence>,
    pub message: String,
}
