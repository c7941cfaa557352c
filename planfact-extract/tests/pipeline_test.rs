//! End-to-end pipeline scenarios with mock collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use planfact_core::config::ExtractConfig;
use planfact_core::errors::{RemoteError, StorageError};
use planfact_core::traits::{
    LlmExtraction, LlmExtractor, OcrOutcome, OcrProvider, PropertyRecord, ResultStore,
};
use planfact_core::types::page::PageText;
use planfact_core::types::result::{CacheStatus, ExtractionResult, ReconcileOutcome, RunStatus};
use planfact_core::types::signal::SourceType;
use planfact_core::Cancellation;
use planfact_extract::pipeline::content_hash;
use planfact_extract::{DocumentInput, Pipeline, RunOptions};

const COVER_PAGE: &str = "COVER SHEET\nPROJECT DATA\nPROPOSED 14 UNIT RESIDENTIAL BUILDING\n7-STORY";
const ZONING_PAGE: &str = "ZONING ANALYSIS\nZONING DISTRICT: R6A\nLOT AREA: 10,000 SF\nFLOOR AREA RATIO: 3.44\nTOTAL DWELLING UNITS: 14";

fn two_source_document() -> DocumentInput {
    DocumentInput::Pages(vec![COVER_PAGE.to_string(), ZONING_PAGE.to_string()])
}

/// Counts calls so tests can assert a collaborator was never reached.
struct CountingOcr {
    calls: AtomicUsize,
}

#[async_trait]
impl OcrProvider for CountingOcr {
    async fn is_available(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        false
    }

    async fn recognize(&self, _document: &[u8], _pages: &[usize]) -> Result<OcrOutcome, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OcrOutcome::default())
    }
}

struct FixedLlm {
    extraction: LlmExtraction,
}

#[async_trait]
impl LlmExtractor for FixedLlm {
    async fn extract(
        &self,
        _pages: &[PageText],
        _reference: Option<&PropertyRecord>,
    ) -> Result<LlmExtraction, RemoteError> {
        Ok(self.extraction.clone())
    }
}

#[derive(Default)]
struct InMemoryStore {
    rows: Mutex<std::collections::HashMap<String, ExtractionResult>>,
}

impl ResultStore for InMemoryStore {
    fn load(&self, content_hash: &str) -> Result<Option<ExtractionResult>, StorageError> {
        Ok(self.rows.lock().unwrap().get(content_hash).cloned())
    }

    fn store(&self, content_hash: &str, result: &ExtractionResult) -> Result<(), StorageError> {
        self.rows
            .lock()
            .unwrap()
            .insert(content_hash.to_string(), result.clone());
        Ok(())
    }
}

#[tokio::test]
async fn two_agreeing_sources_resolve_with_high_confidence() {
    let pipeline = Pipeline::new(ExtractConfig::default());
    let result = pipeline
        .run(two_source_document(), &RunOptions::default())
        .await;

    assert_eq!(result.run_status, RunStatus::Complete);
    let units = result.facts.total_units.as_ref().expect("resolved units");
    assert_eq!(units.value, 14);
    assert!(
        units.confidence >= 0.85,
        "agreeing sources boost confidence, got {}",
        units.confidence
    );
    assert!(!units.evidence.is_empty());
    assert_eq!(result.redundancy_score, 0.85, "two distinct corroborating sources");

    // Supporting facts from the zoning analysis.
    assert_eq!(result.facts.zoning_district.as_ref().unwrap().value, "R6A");
    assert_eq!(result.facts.lot_area_sf.as_ref().unwrap().value, 10_000.0);
    assert_eq!(result.facts.floor_count.as_ref().unwrap().value, 7);
}

#[tokio::test]
async fn every_resolved_numeric_field_is_evidence_backed() {
    let pipeline = Pipeline::new(ExtractConfig::default());
    let result = pipeline
        .run(two_source_document(), &RunOptions::default())
        .await;

    let facts = &result.facts;
    if let Some(signal) = &facts.total_units {
        assert!(!signal.evidence.is_empty());
    }
    if let Some(signal) = &facts.lot_area_sf {
        assert!(!signal.evidence.is_empty());
    }
    if let Some(signal) = &facts.floor_area_ratio {
        assert!(!signal.evidence.is_empty());
    }
    if let Some(signal) = &facts.floor_count {
        assert!(!signal.evidence.is_empty());
    }
}

#[tokio::test]
async fn already_cancelled_token_returns_before_any_collaborator_call() {
    let ocr = CountingOcr {
        calls: AtomicUsize::new(0),
    };
    let cancel = Cancellation::new();
    cancel.cancel();

    let pipeline = Pipeline::new(ExtractConfig::default())
        .with_ocr(&ocr)
        .with_cancellation(cancel);
    let result = pipeline
        .run(
            DocumentInput::Bytes(b"raw document".to_vec()),
            &RunOptions::default(),
        )
        .await;

    assert_eq!(result.run_status, RunStatus::Cancelled);
    assert!(result.facts.total_units.is_none());
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0, "no collaborator was reached");
}

#[tokio::test]
async fn empty_input_yields_the_designated_empty_result() {
    let pipeline = Pipeline::new(ExtractConfig::default());
    let result = pipeline
        .run(DocumentInput::Pages(Vec::new()), &RunOptions::default())
        .await;
    assert_eq!(result.run_status, RunStatus::EmptyInput);
    assert!(!result.warnings.is_empty());
}

#[tokio::test]
async fn conflicting_sources_penalize_the_outlier_and_flag_a_gate() {
    let pages = DocumentInput::Pages(vec![
        "COVER SHEET\nPROJECT DATA\nPROPOSED 14 UNIT RESIDENTIAL BUILDING".to_string(),
        "ZONING ANALYSIS\nZONING DISTRICT: R6A\nLOT AREA: 10,000 SF\nTOTAL DWELLING UNITS: 150"
            .to_string(),
    ]);
    let pipeline = Pipeline::new(ExtractConfig::default());
    let result = pipeline.run(pages, &RunOptions::default()).await;

    let units = result.facts.total_units.as_ref().unwrap();
    assert_eq!(units.value, 14, "the small count wins over the wild outlier");
    let warning = result
        .warnings
        .iter()
        .find(|w| w.contains("150") && w.contains("14"))
        .expect("outlier warning names both values");
    assert!(warning.contains("cover_sheet") && warning.contains("zoning_text"));

    let gate = result
        .gates
        .iter()
        .find(|g| g.field == planfact_core::types::gate::GateField::MentionAgreement)
        .expect("mention gate fires");
    assert_eq!(gate.status, planfact_core::types::gate::GateStatus::Conflicting);
}

#[tokio::test]
async fn llm_agreement_boosts_confidence_and_redundancy() {
    let llm = FixedLlm {
        extraction: LlmExtraction {
            total_units: Some(14),
            floor_count: Some(7),
            ..Default::default()
        },
    };
    let pipeline = Pipeline::new(ExtractConfig::default()).with_llm(&llm);
    let options = RunOptions {
        enable_llm: true,
        ..Default::default()
    };
    let result = pipeline.run(two_source_document(), &options).await;

    let units = result.facts.total_units.as_ref().unwrap();
    assert!(units.confidence > 0.95, "rule agreement plus LLM boost");
    assert!(result
        .reconciliations
        .iter()
        .any(|r| r.field == "total_units" && r.outcome == ReconcileOutcome::Agreed));
    assert!(result
        .mentions
        .iter()
        .any(|m| m.source == SourceType::Llm && m.value == 14));
    assert_eq!(
        result.redundancy_score, 0.95,
        "the synthetic llm mention lifts corroboration to three sources"
    );
}

#[tokio::test]
async fn llm_disabled_runs_are_unchanged_by_a_wired_extractor() {
    let llm = FixedLlm {
        extraction: LlmExtraction {
            total_units: Some(99),
            ..Default::default()
        },
    };
    let pipeline = Pipeline::new(ExtractConfig::default()).with_llm(&llm);
    let result = pipeline
        .run(two_source_document(), &RunOptions::default())
        .await;
    assert!(result.reconciliations.is_empty());
    assert_eq!(result.facts.total_units.as_ref().unwrap().value, 14);
}

#[tokio::test]
async fn cache_hit_skips_recomputation_and_tags_the_result() {
    let store = InMemoryStore::default();
    let bytes = b"not even a pdf".to_vec();
    let hash = content_hash(&bytes);

    let mut canned = ExtractionResult::empty(RunStatus::Complete);
    canned.redundancy_score = 0.85;
    canned.content_hash = Some(hash.clone());
    store.store(&hash, &canned).unwrap();

    let pipeline = Pipeline::new(ExtractConfig::default()).with_store(&store);
    let result = pipeline
        .run(DocumentInput::Bytes(bytes), &RunOptions::default())
        .await;

    assert_eq!(result.cache_status, CacheStatus::Hit);
    assert_eq!(result.redundancy_score, 0.85);
}

#[tokio::test]
async fn validation_gates_fire_with_reference_data() {
    let options = RunOptions {
        reference: Some(PropertyRecord {
            lot_area_sf: 10_000.0,
            resid_far: 3.0,
            bldg_area_sf: None,
        }),
        ..Default::default()
    };
    let pipeline = Pipeline::new(ExtractConfig::default());
    let result = pipeline.run(two_source_document(), &options).await;

    use planfact_core::types::gate::GateField;
    let fields: Vec<GateField> = result.gates.iter().map(|g| g.field).collect();
    assert!(fields.contains(&GateField::UnitCount));
    assert!(fields.contains(&GateField::FloorAreaRatio));
    assert!(fields.contains(&GateField::LotArea));
}
