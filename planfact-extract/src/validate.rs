//! Validation gates: advisory cross-checks of resolved values against
//! authoritative property records.
//!
//! Gates never mutate the underlying signals and never fail the run; the
//! caller reads them to decide whether manual confirmation is required.

use planfact_core::config::ValidationPolicy;
use planfact_core::traits::PropertyRecord;
use planfact_core::types::gate::{GateField, GateStatus, ValidationGate};
use planfact_core::types::result::ResolvedFacts;
use planfact_core::types::signal::{Signal, UnitCountMention};

pub struct GateEngine {
    policy: ValidationPolicy,
}

impl GateEngine {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Run every applicable gate. Reference-dependent gates are skipped when
    /// no property record is available; the mention-agreement gate only
    /// needs the resolved value and the mention list.
    pub fn run(
        &self,
        facts: &ResolvedFacts,
        mentions: &[UnitCountMention],
        reference: Option<&PropertyRecord>,
        zone_max_far: Option<f64>,
        agreement_window: u32,
    ) -> Vec<ValidationGate> {
        let mut gates = Vec::new();

        if let Some(reference) = reference {
            if let Some(units) = &facts.total_units {
                if let Some(gate) = self.unit_count_gate(units.value, units, reference) {
                    gates.push(gate);
                }
            }
            if let Some(far) = &facts.floor_area_ratio {
                gates.push(self.far_gate(far, reference, zone_max_far));
            }
            if let Some(lot) = &facts.lot_area_sf {
                gates.push(self.lot_area_gate(lot, reference));
            }
        }

        if let Some(units) = &facts.total_units {
            if let Some(gate) = self.mention_gate(units, mentions, agreement_window) {
                gates.push(gate);
            }
        }

        gates
    }

    /// Implied unit-count range from reference lot area × FAR, assuming the
    /// policy's usable-area ratio and per-unit size bounds, widened by the
    /// tolerance factors.
    fn unit_count_gate(
        &self,
        extracted: u32,
        signal: &Signal<u32>,
        reference: &PropertyRecord,
    ) -> Option<ValidationGate> {
        if reference.lot_area_sf <= 0.0 || reference.resid_far <= 0.0 {
            return None;
        }
        let buildable = reference.lot_area_sf * reference.resid_far * self.policy.usable_area_ratio;
        let implied_min = buildable / self.policy.max_unit_sf;
        let implied_max = buildable / self.policy.min_unit_sf;
        let hard_floor = implied_min * self.policy.unit_floor_factor;
        let hard_ceiling = implied_max * self.policy.unit_ceiling_factor;

        let value = extracted as f64;
        let status = if value >= implied_min && value <= implied_max {
            GateStatus::Pass
        } else if value >= hard_floor && value <= hard_ceiling {
            GateStatus::Warn
        } else {
            GateStatus::NeedsOverride
        };

        Some(ValidationGate {
            field: GateField::UnitCount,
            extracted_value: value,
            expected_range: Some((implied_min, implied_max)),
            city_basis: Some(reference.lot_area_sf),
            status,
            evidence: signal.evidence.clone(),
            message: format!(
                "extracted {extracted} units vs implied range {:.0}-{:.0} \
                 (lot {:.0} SF x FAR {:.2} x {:.0}% usable)",
                implied_min,
                implied_max,
                reference.lot_area_sf,
                reference.resid_far,
                self.policy.usable_area_ratio * 100.0
            ),
        })
    }

    /// FAR within tolerance of the reference passes; beyond it, staying
    /// under the zone's maximum-affordable-FAR ceiling is a warning, past
    /// the ceiling needs an override.
    fn far_gate(
        &self,
        signal: &Signal<f64>,
        reference: &PropertyRecord,
        zone_max_far: Option<f64>,
    ) -> ValidationGate {
        let extracted = signal.value;
        let deviation = relative_deviation(extracted, reference.resid_far);
        let status = if deviation <= self.policy.far_tolerance {
            GateStatus::Pass
        } else if zone_max_far.is_some_and(|ceiling| extracted <= ceiling) {
            GateStatus::Warn
        } else {
            GateStatus::NeedsOverride
        };

        ValidationGate {
            field: GateField::FloorAreaRatio,
            extracted_value: extracted,
            expected_range: Some((
                reference.resid_far * (1.0 - self.policy.far_tolerance),
                reference.resid_far * (1.0 + self.policy.far_tolerance),
            )),
            city_basis: Some(reference.resid_far),
            status,
            evidence: signal.evidence.clone(),
            message: format!(
                "extracted FAR {extracted:.2} deviates {:.1}% from reference {:.2}",
                deviation * 100.0,
                reference.resid_far
            ),
        }
    }

    /// Lot-area deviation ladder: pass, warn, needs-override.
    fn lot_area_gate(
        &self,
        signal: &Signal<f64>,
        reference: &PropertyRecord,
    ) -> ValidationGate {
        let extracted = signal.value;
        let deviation = relative_deviation(extracted, reference.lot_area_sf);
        let status = if deviation <= self.policy.lot_area_pass {
            GateStatus::Pass
        } else if deviation <= self.policy.lot_area_warn {
            GateStatus::Warn
        } else {
            GateStatus::NeedsOverride
        };

        ValidationGate {
            field: GateField::LotArea,
            extracted_value: extracted,
            expected_range: Some((
                reference.lot_area_sf * (1.0 - self.policy.lot_area_warn),
                reference.lot_area_sf * (1.0 + self.policy.lot_area_warn),
            )),
            city_basis: Some(reference.lot_area_sf),
            status,
            evidence: signal.evidence.clone(),
            message: format!(
                "extracted lot area {extracted:.0} SF deviates {:.1}% from reference {:.0} SF",
                deviation * 100.0,
                reference.lot_area_sf
            ),
        }
    }

    /// Cross-mention conflict: mentions disagreeing with the resolved value
    /// beyond the agreement window warn; large deviation with thin
    /// corroboration escalates to Conflicting.
    fn mention_gate(
        &self,
        signal: &Signal<u32>,
        mentions: &[UnitCountMention],
        agreement_window: u32,
    ) -> Option<ValidationGate> {
        let resolved = signal.value;
        let disagreeing: Vec<&UnitCountMention> = mentions
            .iter()
            .filter(|m| m.value.abs_diff(resolved) > agreement_window)
            .collect();
        if disagreeing.is_empty() {
            return None;
        }

        let agreeing_sources = {
            let mut pairs = std::collections::HashSet::new();
            for m in mentions {
                if m.value.abs_diff(resolved) <= agreement_window {
                    pairs.insert((m.source, m.page));
                }
            }
            pairs.len()
        };
        let worst_deviation = disagreeing
            .iter()
            .map(|m| relative_deviation(m.value as f64, resolved as f64))
            .fold(0.0f64, f64::max);

        let status = if worst_deviation > self.policy.mention_conflict_ratio && agreeing_sources < 2
        {
            GateStatus::Conflicting
        } else {
            GateStatus::Warn
        };

        Some(ValidationGate {
            field: GateField::MentionAgreement,
            extracted_value: resolved as f64,
            expected_range: None,
            city_basis: None,
            status,
            evidence: signal.evidence.clone(),
            message: format!(
                "{} mention(s) disagree with resolved count {resolved} (worst deviation {:.0}%, \
                 {agreeing_sources} agreeing source(s))",
                disagreeing.len(),
                worst_deviation * 100.0
            ),
        })
    }
}

/// |extracted − reference| / reference; 0 when the reference is 0.
fn relative_deviation(extracted: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    (extracted - reference).abs() / reference
}

#[cfg(test)]
mod tests {
    use super::*;
    use planfact_core::types::signal::{Evidence, SourceType};

    fn engine() -> GateEngine {
        GateEngine::new(ValidationPolicy::default())
    }

    fn reference() -> PropertyRecord {
        PropertyRecord {
            lot_area_sf: 10_000.0,
            resid_far: 3.0,
            bldg_area_sf: None,
        }
    }

    fn facts_with_far(value: f64) -> ResolvedFacts {
        ResolvedFacts {
            floor_area_ratio: Some(Signal::new(
                value,
                0.9,
                Evidence::from_text(1, format!("FAR {value}"), SourceType::ZoningText, 0.9),
            )),
            ..Default::default()
        }
    }

    fn facts_with_lot(value: f64) -> ResolvedFacts {
        ResolvedFacts {
            lot_area_sf: Some(Signal::new(
                value,
                0.9,
                Evidence::from_text(1, format!("LOT AREA {value}"), SourceType::ZoningText, 0.9),
            )),
            ..Default::default()
        }
    }

    #[test]
    fn far_deviation_of_exactly_twenty_percent_passes() {
        let gates = engine().run(&facts_with_far(3.6), &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].field, GateField::FloorAreaRatio);
        assert_eq!(gates[0].status, GateStatus::Pass, "20% is the pass boundary");

        let gates = engine().run(&facts_with_far(3.61), &[], Some(&reference()), Some(4.6), 2);
        assert_eq!(gates[0].status, GateStatus::Warn, "past 20% but under the ceiling");

        let gates = engine().run(&facts_with_far(4.8), &[], Some(&reference()), Some(4.6), 2);
        assert_eq!(gates[0].status, GateStatus::NeedsOverride);

        let gates = engine().run(&facts_with_far(4.8), &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].status, GateStatus::NeedsOverride, "no ceiling known");
    }

    #[test]
    fn lot_area_boundaries_are_exact() {
        let gates = engine().run(&facts_with_lot(10_800.0), &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].status, GateStatus::Pass, "8% deviation is still a pass");

        let gates = engine().run(&facts_with_lot(11_500.0), &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].status, GateStatus::Warn, "15% deviation is still a warn");

        let gates = engine().run(&facts_with_lot(11_501.0), &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].status, GateStatus::NeedsOverride);
    }

    #[test]
    fn unit_count_gate_derives_an_implied_range() {
        // buildable = 10000 * 3.0 * 0.8 = 24000 SF
        // implied 30 (800 SF units) to ~35.3 (680 SF units)
        let facts = ResolvedFacts {
            total_units: Some(Signal::new(
                32,
                0.9,
                Evidence::from_text(0, "32 UNITS", SourceType::CoverSheet, 0.9),
            )),
            ..Default::default()
        };
        let gates = engine().run(&facts, &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].field, GateField::UnitCount);
        assert_eq!(gates[0].status, GateStatus::Pass);

        let facts = ResolvedFacts {
            total_units: Some(Signal::new(
                50,
                0.9,
                Evidence::from_text(0, "50 UNITS", SourceType::CoverSheet, 0.9),
            )),
            ..Default::default()
        };
        let gates = engine().run(&facts, &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].status, GateStatus::Warn, "within the 1.5x ceiling");

        let facts = ResolvedFacts {
            total_units: Some(Signal::new(
                200,
                0.9,
                Evidence::from_text(0, "200 UNITS", SourceType::CoverSheet, 0.9),
            )),
            ..Default::default()
        };
        let gates = engine().run(&facts, &[], Some(&reference()), None, 2);
        assert_eq!(gates[0].status, GateStatus::NeedsOverride);
    }

    #[test]
    fn mention_conflict_escalates_with_thin_corroboration() {
        let units = ResolvedFacts {
            total_units: Some(Signal::new(
                14,
                0.9,
                Evidence::from_text(0, "14 UNITS", SourceType::CoverSheet, 0.9),
            )),
            ..Default::default()
        };
        let mention = |value, page, source| UnitCountMention {
            value,
            page,
            source,
            snippet: String::new(),
            confidence: 0.8,
        };

        // One agreeing source, one wildly disagreeing mention → Conflicting.
        let mentions = vec![
            mention(14, 0, SourceType::CoverSheet),
            mention(150, 5, SourceType::ZoningText),
        ];
        let gates = engine().run(&units, &mentions, None, None, 2);
        assert_eq!(gates[0].field, GateField::MentionAgreement);
        assert_eq!(gates[0].status, GateStatus::Conflicting);

        // Two agreeing sources → the same disagreement is only a warning.
        let mentions = vec![
            mention(14, 0, SourceType::CoverSheet),
            mention(13, 4, SourceType::ZoningText),
            mention(150, 5, SourceType::Table),
        ];
        let gates = engine().run(&units, &mentions, None, None, 2);
        assert_eq!(gates[0].status, GateStatus::Warn);

        // All mentions within the window → no gate at all.
        let mentions = vec![mention(14, 0, SourceType::CoverSheet)];
        assert!(engine().run(&units, &mentions, None, None, 2).is_empty());
    }

    #[test]
    fn no_reference_disables_reference_gates() {
        let gates = engine().run(&facts_with_far(9.9), &[], None, None, 2);
        assert!(gates.is_empty());
    }
}
