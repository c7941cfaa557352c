//! The externally consumed aggregate result.
//!
//! `ExtractionResult` is the only artifact handed to collaborators outside
//! the pipeline: JSON-serializable, free of internal stage state, and it
//! round-trips through the cache without loss.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::gate::ValidationGate;
use super::signal::{Signal, UnitCountMention};
use super::unit::UnitMix;

/// How the run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Cancelled,
    EmptyInput,
}

/// Whether the result was computed fresh or served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Computed,
    Hit,
}

/// Topical category a page can score in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceCategory {
    UnitSchedule,
    ZoningAnalysis,
    CoverSheet,
    AffordableHousing,
    FloorPlan,
}

impl RelevanceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnitSchedule => "unit_schedule",
            Self::ZoningAnalysis => "zoning_analysis",
            Self::CoverSheet => "cover_sheet",
            Self::AffordableHousing => "affordable_housing",
            Self::FloorPlan => "floor_plan",
        }
    }
}

/// Relevance outcome for a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRelevance {
    pub page: usize,
    pub score: u32,
    pub categories: Vec<RelevanceCategory>,
    /// Whether the page made the bounded selection for the LLM pass.
    pub selected: bool,
}

/// Outcome of reconciling one field against the LLM extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Values agreed within tolerance; confidence boosted.
    Agreed,
    /// Values disagreed; the rule-based value was kept.
    RuleKept,
    /// Values disagreed; reference data favored the LLM value.
    LlmPreferred,
    /// The field only existed in the LLM output.
    LlmOnly,
}

/// One field's reconciliation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_value: Option<String>,
    pub outcome: ReconcileOutcome,
    pub note: String,
}

/// Resolved, confidence-scored project facts. Every populated field is backed
/// by at least one signal with non-empty evidence; a field the pipeline could
/// not defend is `None`, never an unexplained number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_units: Option<Signal<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_mix: Option<Signal<UnitMix>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_area_sf: Option<Signal<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_area_ratio: Option<Signal<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoning_district: Option<Signal<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_count: Option<Signal<u32>>,
}

/// The aggregate handed to external consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub run_status: RunStatus,
    pub cache_status: CacheStatus,
    /// xxh3-128 hex digest of the input document, when bytes were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub facts: ResolvedFacts,
    pub mentions: Vec<UnitCountMention>,
    /// How many independent sources corroborate the resolved unit count.
    pub redundancy_score: f32,
    pub gates: Vec<ValidationGate>,
    pub reconciliations: Vec<ReconciliationRecord>,
    pub page_relevance: Vec<PageRelevance>,
    pub warnings: Vec<String>,
    pub stage_timings_ms: BTreeMap<String, u64>,
}

impl ExtractionResult {
    /// The designated empty result for cancelled or input-less runs.
    pub fn empty(run_status: RunStatus) -> Self {
        Self {
            run_status,
            cache_status: CacheStatus::Computed,
            content_hash: None,
            facts: ResolvedFacts::default(),
            mentions: Vec::new(),
            redundancy_score: 0.0,
            gates: Vec::new(),
            reconciliations: Vec::new(),
            page_relevance: Vec::new(),
            warnings: Vec::new(),
            stage_timings_ms: BTreeMap::new(),
        }
    }

    /// Copy served on a cache hit, re-tagged so consumers can tell it apart
    /// from a fresh computation.
    pub fn as_cache_hit(&self) -> Self {
        let mut copy = self.clone();
        copy.cache_status = CacheStatus::Hit;
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::signal::{Evidence, SourceType};

    #[test]
    fn result_json_roundtrip() {
        let mut result = ExtractionResult::empty(RunStatus::Complete);
        result.facts.total_units = Some(Signal::new(
            14,
            0.9,
            Evidence::from_text(0, "PROPOSED 14 UNIT RESIDENTIAL BUILDING", SourceType::CoverSheet, 0.9),
        ));
        result.redundancy_score = 0.85;
        result.stage_timings_ms.insert("ingest".into(), 12);

        let json = serde_json::to_string(&result).unwrap();
        let parsed: ExtractionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.facts.total_units.as_ref().unwrap().value, 14);
        assert_eq!(parsed.redundancy_score, 0.85);
        assert_eq!(parsed.stage_timings_ms["ingest"], 12);
    }

    #[test]
    fn cache_hit_copy_changes_only_the_marker() {
        let result = ExtractionResult::empty(RunStatus::Complete);
        let hit = result.as_cache_hit();
        assert_eq!(hit.cache_status, CacheStatus::Hit);
        assert_eq!(hit.run_status, result.run_status);
        assert_eq!(hit.redundancy_score, result.redundancy_score);
    }
}
