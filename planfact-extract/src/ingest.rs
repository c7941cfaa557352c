//! Text ingestion: per-page native text with scanned-page classification.
//!
//! Pure and deterministic given the document bytes: no network access, no
//! OCR. Pages that look scanned (low character yield or low printable ratio)
//! are flagged here and escalated in the OCR stage.

use lopdf::Document;
use planfact_core::config::IngestPolicy;
use planfact_core::errors::IngestError;
use planfact_core::types::page::PageText;

/// Extract per-page text from raw document bytes.
pub fn ingest_document(bytes: &[u8], policy: &IngestPolicy) -> Result<Vec<PageText>, IngestError> {
    let document = Document::load_mem(bytes).map_err(|e| IngestError::UnreadableDocument {
        message: e.to_string(),
    })?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(IngestError::NoPages);
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    for (index, number) in page_numbers.iter().enumerate() {
        // A page whose content stream cannot be decoded yields empty text and
        // is picked up by the scanned heuristic below.
        let text = document.extract_text(&[*number]).unwrap_or_default();
        pages.push(build_page(index, text, policy));
    }
    Ok(pages)
}

/// Build pages from pre-extracted texts (validation-only re-runs).
pub fn pages_from_texts(texts: Vec<String>, policy: &IngestPolicy) -> Vec<PageText> {
    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| build_page(index, text, policy))
        .collect()
}

fn build_page(index: usize, text: String, policy: &IngestPolicy) -> PageText {
    let char_count = text.chars().filter(|c| !c.is_whitespace()).count();
    let scanned =
        char_count < policy.min_char_count || printable_ratio(&text) < policy.min_printable_ratio;
    PageText::new(index, text, scanned)
}

/// Ratio of alphanumeric + common punctuation to all non-whitespace
/// characters. Empty (or whitespace-only) pages score 0.
pub fn printable_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut printable = 0usize;
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        total += 1;
        if c.is_alphanumeric() || COMMON_PUNCTUATION.contains(c) {
            printable += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    printable as f64 / total as f64
}

const COMMON_PUNCTUATION: &str = ".,;:!?()[]{}'\"-_/&#%+=@*";
