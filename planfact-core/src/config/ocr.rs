//! Ingestion and OCR-escalation policy.

use serde::{Deserialize, Serialize};

/// Thresholds for flagging a page as likely scanned during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestPolicy {
    /// Pages with fewer non-whitespace characters than this are likely scanned.
    pub min_char_count: usize,
    /// Pages whose printable-character ratio falls below this are likely scanned.
    pub min_printable_ratio: f64,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            min_char_count: 100,
            min_printable_ratio: 0.5,
        }
    }
}

/// Caps and triggers for the OCR escalation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrPolicy {
    /// At most this many scanned pages are sent to OCR per run.
    pub max_scanned_pages: usize,
    /// At most this many low-signal pages are sent in the secondary pass.
    pub max_low_signal_pages: usize,
    /// A page with adequate text but fewer domain-keyword hits than this is
    /// low-signal.
    pub min_keyword_hits: usize,
    /// The secondary pass only runs when low-signal pages are at most this
    /// fraction of the document.
    pub max_low_signal_page_ratio: f64,
}

impl Default for OcrPolicy {
    fn default() -> Self {
        Self {
            max_scanned_pages: 20,
            max_low_signal_pages: 5,
            min_keyword_hits: 2,
            max_low_signal_page_ratio: 0.5,
        }
    }
}
