//! LLM reconciliation: a strictly field-by-field comparator between the
//! rule-based resolved facts and a separately obtained language-model
//! extraction. Never a re-extraction: agreement boosts confidence,
//! disagreement keeps the rule-based value unless authoritative reference
//! data says the model was closer, and LLM-only fields come in at a fixed
//! lower confidence.

use planfact_core::config::ReconcilePolicy;
use planfact_core::traits::{LlmExtraction, PropertyRecord};
use planfact_core::types::result::{ReconcileOutcome, ReconciliationRecord, ResolvedFacts};
use planfact_core::types::signal::{Evidence, Signal, SourceType, UnitCountMention};
use planfact_core::types::unit::UnitMix;

/// What the reconciliation pass produced.
#[derive(Debug, Default)]
pub struct ReconcileOutput {
    pub records: Vec<ReconciliationRecord>,
    /// Synthetic mentions so the redundancy score benefits from LLM
    /// corroboration.
    pub mentions: Vec<UnitCountMention>,
}

pub struct Reconciler {
    policy: ReconcilePolicy,
}

impl Reconciler {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self { policy }
    }

    /// Reconcile every overlapping field, mutating `facts` in place.
    /// `llm_page` is the first page the model actually read, used for the
    /// synthetic evidence and mentions.
    pub fn run(
        &self,
        facts: &mut ResolvedFacts,
        llm: &LlmExtraction,
        reference: Option<&PropertyRecord>,
        llm_page: usize,
    ) -> ReconcileOutput {
        let mut output = ReconcileOutput::default();

        self.count_field(
            &mut facts.total_units,
            llm.total_units,
            "total_units",
            llm_page,
            &mut output,
        );
        if let Some(total) = llm.total_units {
            output.mentions.push(UnitCountMention {
                value: total,
                page: llm_page,
                source: SourceType::Llm,
                snippet: format!("language-model extraction: {total} units"),
                confidence: self.policy.llm_only_confidence,
            });
        }

        self.count_field(
            &mut facts.floor_count,
            llm.floor_count,
            "floor_count",
            llm_page,
            &mut output,
        );
        self.float_field(
            &mut facts.lot_area_sf,
            llm.lot_area_sf,
            "lot_area_sf",
            reference.map(|r| r.lot_area_sf),
            llm_page,
            &mut output,
        );
        self.float_field(
            &mut facts.floor_area_ratio,
            llm.floor_area_ratio,
            "floor_area_ratio",
            reference.map(|r| r.resid_far),
            llm_page,
            &mut output,
        );
        self.zone_field(facts, llm, llm_page, &mut output);
        self.mix_field(facts, llm, llm_page, &mut output);

        output
    }

    fn count_field(
        &self,
        rule: &mut Option<Signal<u32>>,
        llm_value: Option<u32>,
        field: &str,
        llm_page: usize,
        output: &mut ReconcileOutput,
    ) {
        let Some(llm_value) = llm_value else {
            return;
        };
        match rule {
            Some(signal) => {
                if signal.value.abs_diff(llm_value) <= self.policy.count_tolerance {
                    let rule_value = signal.value.to_string();
                    self.boost(signal, field, rule_value, llm_value.to_string(), llm_page, output);
                } else {
                    // Counts carry no direct reference value; the rule-based
                    // signal stands.
                    output.records.push(self.record(
                        field,
                        Some(signal.value.to_string()),
                        Some(llm_value.to_string()),
                        ReconcileOutcome::RuleKept,
                        "kept rule-based value over disagreeing LLM value",
                    ));
                }
            }
            None => {
                *rule = Some(self.llm_only_signal(
                    llm_value,
                    format!("{field} found only by language model: {llm_value}"),
                    llm_page,
                ));
                output.records.push(self.record(
                    field,
                    None,
                    Some(llm_value.to_string()),
                    ReconcileOutcome::LlmOnly,
                    "LLM-only field accepted at reduced confidence",
                ));
            }
        }
    }

    fn float_field(
        &self,
        rule: &mut Option<Signal<f64>>,
        llm_value: Option<f64>,
        field: &str,
        reference: Option<f64>,
        llm_page: usize,
        output: &mut ReconcileOutput,
    ) {
        let Some(llm_value) = llm_value else {
            return;
        };
        match rule {
            Some(signal) => {
                let rule_value = signal.value;
                let tolerance = self.policy.relative_tolerance * rule_value.abs().max(f64::EPSILON);
                if (rule_value - llm_value).abs() <= tolerance {
                    self.boost(
                        signal,
                        field,
                        rule_value.to_string(),
                        llm_value.to_string(),
                        llm_page,
                        output,
                    );
                    return;
                }
                // Disagreement: reference data, when present, arbitrates.
                let llm_wins = reference.is_some_and(|basis| {
                    (llm_value - basis).abs() < (rule_value - basis).abs()
                });
                if llm_wins {
                    signal.value = llm_value;
                    signal.push_evidence(Evidence::from_text(
                        llm_page,
                        format!("language-model value {llm_value} closer to city record"),
                        SourceType::Llm,
                        self.policy.llm_only_confidence,
                    ));
                    output.records.push(self.record(
                        field,
                        Some(rule_value.to_string()),
                        Some(llm_value.to_string()),
                        ReconcileOutcome::LlmPreferred,
                        "LLM value deviates less from authoritative reference",
                    ));
                } else {
                    output.records.push(self.record(
                        field,
                        Some(rule_value.to_string()),
                        Some(llm_value.to_string()),
                        ReconcileOutcome::RuleKept,
                        "kept rule-based value over disagreeing LLM value",
                    ));
                }
            }
            None => {
                *rule = Some(self.llm_only_signal(
                    llm_value,
                    format!("{field} found only by language model: {llm_value}"),
                    llm_page,
                ));
                output.records.push(self.record(
                    field,
                    None,
                    Some(llm_value.to_string()),
                    ReconcileOutcome::LlmOnly,
                    "LLM-only field accepted at reduced confidence",
                ));
            }
        }
    }

    fn zone_field(
        &self,
        facts: &mut ResolvedFacts,
        llm: &LlmExtraction,
        llm_page: usize,
        output: &mut ReconcileOutput,
    ) {
        let Some(llm_zone) = llm.zoning_district.as_deref() else {
            return;
        };
        let normalized_llm = normalize_zone(llm_zone);
        match &mut facts.zoning_district {
            Some(signal) => {
                if normalize_zone(&signal.value) == normalized_llm {
                    let rule_value = signal.value.clone();
                    self.boost(signal, "zoning_district", rule_value, normalized_llm, llm_page, output);
                } else {
                    output.records.push(self.record(
                        "zoning_district",
                        Some(signal.value.clone()),
                        Some(normalized_llm),
                        ReconcileOutcome::RuleKept,
                        "kept rule-based value over disagreeing LLM value",
                    ));
                }
            }
            None => {
                facts.zoning_district = Some(self.llm_only_signal(
                    normalized_llm.clone(),
                    format!("zoning district found only by language model: {normalized_llm}"),
                    llm_page,
                ));
                output.records.push(self.record(
                    "zoning_district",
                    None,
                    Some(normalized_llm),
                    ReconcileOutcome::LlmOnly,
                    "LLM-only field accepted at reduced confidence",
                ));
            }
        }
    }

    fn mix_field(
        &self,
        facts: &mut ResolvedFacts,
        llm: &LlmExtraction,
        llm_page: usize,
        output: &mut ReconcileOutput,
    ) {
        let llm_mix = llm_unit_mix(llm);
        let Some(llm_mix) = llm_mix else {
            return;
        };
        match &mut facts.unit_mix {
            Some(signal) => {
                if signal.value.total().abs_diff(llm_mix.total()) <= self.policy.count_tolerance {
                    let rule_value = format!("{} units", signal.value.total());
                    self.boost(
                        signal,
                        "unit_mix",
                        rule_value,
                        format!("{} units", llm_mix.total()),
                        llm_page,
                        output,
                    );
                } else {
                    output.records.push(self.record(
                        "unit_mix",
                        Some(format!("{} units", signal.value.total())),
                        Some(format!("{} units", llm_mix.total())),
                        ReconcileOutcome::RuleKept,
                        "kept rule-based value over disagreeing LLM value",
                    ));
                }
            }
            None => {
                let note = format!("unit mix found only by language model ({} units)", llm_mix.total());
                facts.unit_mix = Some(self.llm_only_signal(llm_mix.clone(), note, llm_page));
                output.records.push(self.record(
                    "unit_mix",
                    None,
                    Some(format!("{} units", llm_mix.total())),
                    ReconcileOutcome::LlmOnly,
                    "LLM-only field accepted at reduced confidence",
                ));
            }
        }
    }

    fn boost<T>(
        &self,
        signal: &mut Signal<T>,
        field: &str,
        rule_value: String,
        llm_value: String,
        llm_page: usize,
        output: &mut ReconcileOutput,
    ) {
        signal.set_confidence(signal.confidence + self.policy.agreement_boost);
        signal.push_evidence(Evidence::from_text(
            llm_page,
            format!("language-model extraction agrees: {llm_value}"),
            SourceType::Llm,
            self.policy.llm_only_confidence,
        ));
        output.records.push(self.record(
            field,
            Some(rule_value),
            Some(llm_value),
            ReconcileOutcome::Agreed,
            "values agree within tolerance; confidence boosted",
        ));
    }

    fn llm_only_signal<T>(&self, value: T, snippet: String, llm_page: usize) -> Signal<T> {
        Signal::new(
            value,
            self.policy.llm_only_confidence,
            Evidence::from_text(llm_page, snippet, SourceType::Llm, self.policy.llm_only_confidence),
        )
    }

    fn record(
        &self,
        field: &str,
        rule_value: Option<String>,
        llm_value: Option<String>,
        outcome: ReconcileOutcome,
        note: &str,
    ) -> ReconciliationRecord {
        ReconciliationRecord {
            field: field.to_string(),
            rule_value,
            llm_value,
            outcome,
            note: note.to_string(),
        }
    }
}

fn normalize_zone(zone: &str) -> String {
    zone.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Build a unit mix from the model's per-bucket counts, when any exist.
fn llm_unit_mix(llm: &LlmExtraction) -> Option<UnitMix> {
    if llm.studio_units.is_none()
        && llm.one_br_units.is_none()
        && llm.two_br_units.is_none()
        && llm.three_plus_br_units.is_none()
    {
        return None;
    }
    Some(UnitMix {
        studio: llm.studio_units.unwrap_or(0),
        one_br: llm.one_br_units.unwrap_or(0),
        two_br: llm.two_br_units.unwrap_or(0),
        three_plus_br: llm.three_plus_br_units.unwrap_or(0),
        unknown: 0,
    })
}
