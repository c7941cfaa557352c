//! Validation-gate policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Fraction of gross floor area assumed usable for dwelling units.
    pub usable_area_ratio: f64,
    /// Per-unit size bounds in square feet, used to derive an implied
    /// min/max unit count from lot area × FAR.
    pub min_unit_sf: f64,
    pub max_unit_sf: f64,
    /// Tolerance factors widening the implied unit range to gate bounds.
    pub unit_ceiling_factor: f64,
    pub unit_floor_factor: f64,
    /// FAR deviation from reference within this relative tolerance passes.
    pub far_tolerance: f64,
    /// Mention deviation beyond this fraction of the resolved value, with
    /// fewer than two agreeing sources, escalates to Conflicting.
    pub mention_conflict_ratio: f64,
    /// Lot-area relative deviation boundaries: Pass ≤ `lot_area_pass`,
    /// Warn ≤ `lot_area_warn`, NeedsOverride beyond.
    pub lot_area_pass: f64,
    pub lot_area_warn: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            usable_area_ratio: 0.8,
            min_unit_sf: 680.0,
            max_unit_sf: 800.0,
            unit_ceiling_factor: 1.5,
            unit_floor_factor: 0.25,
            far_tolerance: 0.20,
            mention_conflict_ratio: 0.30,
            lot_area_pass: 0.08,
            lot_area_warn: 0.15,
        }
    }
}
