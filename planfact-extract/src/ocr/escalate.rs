//! OCR escalation: send scanned or low-signal pages to the cloud OCR
//! collaborator and merge the output back into page text.
//!
//! The stage is always optional: a missing, unreachable, or failing provider
//! is logged and skipped, and the pipeline proceeds with native text only.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use planfact_core::config::OcrPolicy;
use planfact_core::traits::{OcrProvider, OcrTable};
use planfact_core::types::page::PageText;

use super::postprocess::OcrPostProcessor;

/// Keywords whose absence marks a page as low-signal despite adequate text.
const DOMAIN_KEYWORDS: &[&str] = &[
    "UNIT",
    "DWELLING",
    "ZONING",
    "ZONE",
    "LOT AREA",
    "FLOOR AREA",
    "FAR",
    "RESIDENTIAL",
    "BUILDING",
    "STORY",
    "STORIES",
    "SCHEDULE",
    "APARTMENT",
    "PROPOSED",
];

/// What the escalation stage did, for warnings and table merging downstream.
#[derive(Debug, Default)]
pub struct OcrStageReport {
    /// Pages sent to the OCR service.
    pub pages_requested: Vec<usize>,
    /// Pages whose text was replaced because OCR recovered more characters.
    pub pages_replaced: usize,
    /// Table geometry returned by the service, merged in the table stage.
    pub tables: Vec<OcrTable>,
    /// Whether any OCR call was made (gates the secondary low-signal pass).
    pub used_ocr: bool,
    pub warnings: Vec<String>,
}

pub struct OcrEscalation {
    policy: OcrPolicy,
    post: OcrPostProcessor,
    keywords: AhoCorasick,
}

impl OcrEscalation {
    pub fn new(policy: OcrPolicy) -> Self {
        let keywords = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(DOMAIN_KEYWORDS)
            .expect("static keyword set");
        Self {
            policy,
            post: OcrPostProcessor::new(),
            keywords,
        }
    }

    /// Run both escalation passes, mutating `pages` in place.
    pub async fn run(
        &self,
        provider: Option<&dyn OcrProvider>,
        document: &[u8],
        pages: &mut [PageText],
    ) -> OcrStageReport {
        let mut report = OcrStageReport::default();
        let Some(provider) = provider else {
            tracing::debug!("no OCR provider wired, skipping escalation");
            return report;
        };

        // Pass 1: scanned pages, capped.
        let scanned: Vec<usize> = pages
            .iter()
            .filter(|p| p.is_likely_scanned)
            .map(|p| p.page_index)
            .take(self.policy.max_scanned_pages)
            .collect();
        if !scanned.is_empty() {
            self.recognize_into(provider, document, &scanned, pages, &mut report)
                .await;
        }

        // Pass 2: low-signal pages, adequate text but almost no domain
        // keywords. Only attempted when pass 1 made no OCR call and the
        // condition is not document-wide.
        if !report.used_ocr {
            let low_signal: Vec<usize> = pages
                .iter()
                .filter(|p| !p.is_likely_scanned && self.keyword_hits(&p.text) < self.policy.min_keyword_hits)
                .map(|p| p.page_index)
                .collect();
            let ratio = if pages.is_empty() {
                0.0
            } else {
                low_signal.len() as f64 / pages.len() as f64
            };
            if !low_signal.is_empty() && ratio <= self.policy.max_low_signal_page_ratio {
                let targets: Vec<usize> = low_signal
                    .into_iter()
                    .take(self.policy.max_low_signal_pages)
                    .collect();
                self.recognize_into(provider, document, &targets, pages, &mut report)
                    .await;
            }
        }

        report
    }

    /// Distinct domain keywords present in the text.
    fn keyword_hits(&self, text: &str) -> usize {
        let mut seen = vec![false; DOMAIN_KEYWORDS.len()];
        for m in self.keywords.find_iter(text) {
            seen[m.pattern().as_usize()] = true;
        }
        seen.iter().filter(|hit| **hit).count()
    }

    async fn recognize_into(
        &self,
        provider: &dyn OcrProvider,
        document: &[u8],
        targets: &[usize],
        pages: &mut [PageText],
        report: &mut OcrStageReport,
    ) {
        if !provider.is_available().await {
            tracing::warn!(pages = targets.len(), "OCR provider unavailable, skipping");
            report
                .warnings
                .push("ocr provider unavailable; continuing with native text".to_string());
            return;
        }

        match provider.recognize(document, targets).await {
            Ok(outcome) => {
                report.used_ocr = true;
                report.pages_requested.extend_from_slice(targets);
                for page_result in &outcome.pages {
                    let cleaned = self.post.apply(&page_result.text);
                    if let Some(page) = pages.get_mut(page_result.page) {
                        if page.supersede_with_ocr(&cleaned) {
                            report.pages_replaced += 1;
                        }
                    }
                }
                report.tables.extend(outcome.tables);
            }
            Err(e) if e.is_not_configured() => {
                tracing::debug!("OCR provider not configured, skipping");
            }
            Err(e) => {
                tracing::warn!(error = %e, "OCR call failed, continuing with native text");
                report.warnings.push(format!("ocr call failed: {e}"));
            }
        }
    }
}
