//! Per-page text as produced by ingestion and amended by OCR escalation.

use serde::{Deserialize, Serialize};

/// Text content of one document page.
///
/// Created during ingestion, one per page, never removed mid-pipeline.
/// OCR escalation may replace `text` in place, but only when the OCR pass
/// recovered strictly more characters than the native extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub page_index: usize,
    pub text: String,
    pub char_count: usize,
    pub is_likely_scanned: bool,
}

impl PageText {
    pub fn new(page_index: usize, text: String, is_likely_scanned: bool) -> Self {
        let char_count = text.chars().filter(|c| !c.is_whitespace()).count();
        Self {
            page_index,
            text,
            char_count,
            is_likely_scanned,
        }
    }

    /// Replace this page's text with OCR output.
    ///
    /// Returns `true` if the replacement happened, i.e. the OCR text carries
    /// strictly more non-whitespace characters than what is already here.
    /// A successful replacement clears the scanned flag.
    pub fn supersede_with_ocr(&mut self, ocr_text: &str) -> bool {
        let ocr_chars = ocr_text.chars().filter(|c| !c.is_whitespace()).count();
        if ocr_chars <= self.char_count {
            return false;
        }
        self.text = ocr_text.to_string();
        self.char_count = ocr_chars;
        self.is_likely_scanned = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_supersedes_only_on_strictly_more_characters() {
        let mut page = PageText::new(0, "abc def".to_string(), true);
        assert_eq!(page.char_count, 6);

        assert!(!page.supersede_with_ocr("xy z"));
        assert_eq!(page.text, "abc def");
        assert!(page.is_likely_scanned);

        assert!(!page.supersede_with_ocr("ab cdef"), "equal yield is discarded");

        assert!(page.supersede_with_ocr("much longer recovered text"));
        assert!(!page.is_likely_scanned);
    }
}
