//! Pipeline orchestrator: sequences the extraction stages in fixed order,
//! checks for cancellation between (never inside) stages, reports progress,
//! and assembles the externally consumed aggregate.
//!
//! The public contract is "always returns a result object": no stage is
//! permitted to throw past this boundary. Collaborator failures, implausible
//! data, and cache I/O problems all degrade into warnings and gates.

use std::collections::BTreeMap;
use std::time::Instant;

use xxhash_rust::xxh3::xxh3_128;

use planfact_core::config::ExtractConfig;
use planfact_core::events::{ExtractEventHandler, NullEventHandler, StageEvent};
use planfact_core::traits::{LlmExtractor, OcrProvider, PropertyRecord, ResultStore};
use planfact_core::types::page::PageText;
use planfact_core::types::result::{ExtractionResult, ResolvedFacts, RunStatus};
use planfact_core::types::signal::SourceType;
use planfact_core::Cancellation;

use crate::extractors::{CoverSheetExtractor, UnitScheduleExtractor, ZoningExtractor};
use crate::ingest;
use crate::ocr::OcrEscalation;
use crate::reconcile::Reconciler;
use crate::relevance::RelevanceClassifier;
use crate::resolve::{merge_field, Resolver};
use crate::tables::{from_ocr_tables, reconstruct_native, TableClassifier};
use crate::validate::GateEngine;

/// What the caller hands in: raw bytes, or pre-extracted page texts for a
/// validation-only re-run.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Bytes(Vec<u8>),
    Pages(Vec<String>),
}

impl DocumentInput {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Pages(pages) => pages.is_empty(),
        }
    }
}

/// Per-run options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Authoritative property record; absence disables dependent gates.
    pub reference: Option<PropertyRecord>,
    /// Known maximum-affordable-FAR ceiling for the zone, when the caller
    /// has already resolved the district against the zoning table.
    pub zone_max_far: Option<f64>,
    /// Whether to run the language-model reconciliation pass.
    pub enable_llm: bool,
}

/// Cache key for a document: xxh3-128 of the raw bytes, hex-encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:032x}", xxh3_128(bytes))
}

static NULL_EVENTS: NullEventHandler = NullEventHandler;

pub struct Pipeline<'a> {
    config: ExtractConfig,
    ocr: Option<&'a dyn OcrProvider>,
    llm: Option<&'a dyn LlmExtractor>,
    store: Option<&'a dyn ResultStore>,
    events: &'a dyn ExtractEventHandler,
    cancel: Cancellation,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            config,
            ocr: None,
            llm: None,
            store: None,
            events: &NULL_EVENTS,
            cancel: Cancellation::new(),
        }
    }

    pub fn with_ocr(mut self, provider: &'a dyn OcrProvider) -> Self {
        self.ocr = Some(provider);
        self
    }

    pub fn with_llm(mut self, extractor: &'a dyn LlmExtractor) -> Self {
        self.llm = Some(extractor);
        self
    }

    pub fn with_store(mut self, store: &'a dyn ResultStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_events(mut self, events: &'a dyn ExtractEventHandler) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the full pipeline. Always returns a result object.
    pub async fn run(&self, input: DocumentInput, options: &RunOptions) -> ExtractionResult {
        if self.cancel.is_cancelled() {
            return ExtractionResult::empty(RunStatus::Cancelled);
        }
        if input.is_empty() {
            let mut result = ExtractionResult::empty(RunStatus::EmptyInput);
            result.warnings.push("no input document given".to_string());
            return result;
        }

        let mut warnings: Vec<String> = Vec::new();
        let mut timings: BTreeMap<String, u64> = BTreeMap::new();

        // Cache lookup before any work; failures degrade to recomputation.
        let (document_bytes, page_texts) = match input {
            DocumentInput::Bytes(bytes) => (Some(bytes), None),
            DocumentInput::Pages(texts) => (None, Some(texts)),
        };
        let content_hash = document_bytes.as_deref().map(content_hash);
        if let (Some(hash), Some(store)) = (content_hash.as_deref(), self.store) {
            match store.load(hash) {
                Ok(Some(cached)) => {
                    tracing::debug!(hash, "result cache hit");
                    return cached.as_cache_hit();
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "result cache lookup failed; recomputing");
                }
            }
        }

        // Stage 1: text ingestion.
        let stage_start = Instant::now();
        let mut pages = match (&document_bytes, page_texts) {
            (Some(bytes), _) => match ingest::ingest_document(bytes, &self.config.ingest) {
                Ok(pages) => pages,
                Err(e) => {
                    let mut result = ExtractionResult::empty(RunStatus::EmptyInput);
                    result.content_hash = content_hash;
                    result.warnings.push(format!("ingestion failed: {e}"));
                    return result;
                }
            },
            (None, Some(texts)) => ingest::pages_from_texts(texts, &self.config.ingest),
            (None, None) => unreachable!("input emptiness checked above"),
        };
        self.finish_stage("text ingestion", 10, stage_start, &mut timings);
        if self.cancel.is_cancelled() {
            return self.interrupted(content_hash, warnings, timings);
        }

        // Stages 2-3: OCR escalation with deterministic post-processing.
        let stage_start = Instant::now();
        let escalation = OcrEscalation::new(self.config.ocr.clone());
        let ocr_report = match &document_bytes {
            Some(bytes) => escalation.run(self.ocr, bytes, &mut pages).await,
            // Validation-only re-runs carry no bytes to OCR.
            None => Default::default(),
        };
        for warning in &ocr_report.warnings {
            self.events.on_warning(warning);
        }
        warnings.extend(ocr_report.warnings.iter().cloned());
        self.finish_stage("ocr escalation", 25, stage_start, &mut timings);
        if self.cancel.is_cancelled() {
            return self.interrupted(content_hash, warnings, timings);
        }

        // Stage 4: table reconstruction and classification.
        let stage_start = Instant::now();
        let classifier = TableClassifier::new();
        let mut raw_tables = reconstruct_native(&pages);
        raw_tables.extend(from_ocr_tables(&ocr_report.tables, &raw_tables));
        let tables: Vec<_> = raw_tables
            .into_iter()
            .map(|t| classifier.classify(t))
            .collect();
        self.finish_stage("table classification", 38, stage_start, &mut timings);
        if self.cancel.is_cancelled() {
            return self.interrupted(content_hash, warnings, timings);
        }

        // Stage 5: independent signal extractors.
        let stage_start = Instant::now();
        let cover = CoverSheetExtractor::new(self.config.extractor.clone()).extract(&pages);
        let zoning = ZoningExtractor::new(self.config.extractor.clone()).extract(&pages);
        let schedule = UnitScheduleExtractor::new(self.config.extractor.clone()).extract(&tables);
        let mut mentions = Vec::new();
        mentions.extend(cover.mentions.iter().cloned());
        mentions.extend(zoning.mentions.iter().cloned());
        mentions.extend(schedule.mentions.iter().cloned());
        self.finish_stage("signal extraction", 52, stage_start, &mut timings);
        if self.cancel.is_cancelled() {
            return self.interrupted(content_hash, warnings, timings);
        }

        // Stage 6: page relevance.
        let stage_start = Instant::now();
        let relevance_classifier = RelevanceClassifier::new(self.config.relevance.clone());
        let page_relevance = relevance_classifier.classify(&pages);
        self.finish_stage("page relevance", 62, stage_start, &mut timings);
        if self.cancel.is_cancelled() {
            return self.interrupted(content_hash, warnings, timings);
        }

        // Stage 7: resolution.
        let stage_start = Instant::now();
        let resolver = Resolver::new(
            self.config.resolution.clone(),
            self.config.redundancy.clone(),
        );
        let mut candidates = Vec::new();
        if let Some(signal) = cover.total_units.clone() {
            candidates.push((SourceType::CoverSheet, signal));
        }
        if let Some(signal) = zoning.total_units.clone() {
            candidates.push((SourceType::ZoningText, signal));
        }
        if let Some(signal) = schedule.total_units.clone() {
            candidates.push((SourceType::Table, signal));
        }
        let resolution = resolver.resolve_units(candidates);
        warnings.extend(resolution.warnings.iter().cloned());
        for warning in &resolution.warnings {
            self.events.on_warning(warning);
        }

        let mut facts = ResolvedFacts {
            total_units: resolution.total_units,
            unit_mix: schedule.unit_mix,
            // Zoning text is the primary bulk-data source; the cover sheet
            // backfills whatever it missed.
            lot_area_sf: merge_field(zoning.lot_area_sf, cover.lot_area_sf),
            floor_area_ratio: merge_field(zoning.floor_area_ratio, cover.floor_area_ratio),
            zoning_district: merge_field(zoning.zoning_district, cover.zoning_district),
            floor_count: cover.floor_count,
        };
        let mut redundancy_score = 0.0;
        if let Some(signal) = &mut facts.total_units {
            let (score, distinct) = resolver.redundancy(signal.value, &mentions);
            redundancy_score = score;
            let boost = resolver.corroboration_boost(distinct);
            if boost > 0.0 {
                signal.set_confidence(signal.confidence + boost);
            }
        }
        self.finish_stage("resolution", 72, stage_start, &mut timings);
        if self.cancel.is_cancelled() {
            return self.interrupted(content_hash, warnings, timings);
        }

        // Stage 8: validation gates.
        let stage_start = Instant::now();
        let gates = GateEngine::new(self.config.validation.clone()).run(
            &facts,
            &mentions,
            options.reference.as_ref(),
            options.zone_max_far,
            self.config.resolution.agreement_window,
        );
        self.finish_stage("validation gates", 82, stage_start, &mut timings);
        if self.cancel.is_cancelled() {
            return self.interrupted(content_hash, warnings, timings);
        }

        // Stage 9: optional LLM reconciliation.
        let stage_start = Instant::now();
        let mut reconciliations = Vec::new();
        if options.enable_llm {
            if let Some(extractor) = self.llm {
                let selected: Vec<PageText> = relevance_classifier
                    .selected_pages(&page_relevance, &pages)
                    .into_iter()
                    .cloned()
                    .collect();
                let llm_page = selected.first().map(|p| p.page_index).unwrap_or(0);
                match extractor.extract(&selected, options.reference.as_ref()).await {
                    Ok(extraction) => {
                        let reconciler = Reconciler::new(self.config.reconcile.clone());
                        let output = reconciler.run(
                            &mut facts,
                            &extraction,
                            options.reference.as_ref(),
                            llm_page,
                        );
                        reconciliations = output.records;
                        mentions.extend(output.mentions);
                        warnings.extend(extraction.confidence.warnings.iter().cloned());
                        // LLM corroboration feeds back into the redundancy
                        // score (the resolution-stage boost is not re-applied).
                        if let Some(signal) = &facts.total_units {
                            redundancy_score = resolver.redundancy(signal.value, &mentions).0;
                        }
                    }
                    Err(e) if e.is_not_configured() => {
                        tracing::debug!("LLM extractor not configured, skipping reconciliation");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "LLM extraction failed, keeping rule-based values");
                        warnings.push(format!("llm extraction failed: {e}"));
                    }
                }
            } else {
                tracing::debug!("LLM pass enabled but no extractor wired");
            }
        }
        self.finish_stage("llm reconciliation", 94, stage_start, &mut timings);

        // Finalization: assemble the aggregate and write through to the cache.
        let stage_start = Instant::now();
        let mut result = ExtractionResult::empty(RunStatus::Complete);
        result.content_hash = content_hash.clone();
        result.facts = facts;
        result.mentions = mentions;
        result.redundancy_score = redundancy_score;
        result.gates = gates;
        result.reconciliations = reconciliations;
        result.page_relevance = page_relevance;
        result.warnings = warnings;
        self.finish_stage("finalize", 100, stage_start, &mut timings);
        result.stage_timings_ms = timings;

        if let (Some(hash), Some(store)) = (content_hash.as_deref(), self.store) {
            if let Err(e) = store.store(hash, &result) {
                tracing::warn!(error = %e, "result cache write failed; continuing");
            }
        }
        result
    }

    fn finish_stage(
        &self,
        label: &'static str,
        percent: u8,
        start: Instant,
        timings: &mut BTreeMap<String, u64>,
    ) {
        timings.insert(label.to_string(), start.elapsed().as_millis() as u64);
        self.events.on_stage(&StageEvent { label, percent });
    }

    /// Well-formed partial result for a run cancelled between stages.
    fn interrupted(
        &self,
        content_hash: Option<String>,
        warnings: Vec<String>,
        timings: BTreeMap<String, u64>,
    ) -> ExtractionResult {
        let mut result = ExtractionResult::empty(RunStatus::Cancelled);
        result.content_hash = content_hash;
        result.warnings = warnings;
        result.stage_timings_ms = timings;
        result
    }
}
