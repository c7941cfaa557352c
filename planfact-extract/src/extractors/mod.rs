//! Independent signal extractors.
//!
//! Each extractor restricts itself to semantically relevant pages first and
//! falls back to the whole document only when no such page exists, at
//! reduced confidence. Extractors only ever produce `Signal`s, never bare
//! values, and they reject out-of-plausible-range matches as "not found".

pub mod cover_sheet;
pub mod unit_schedule;
pub mod zoning;

pub use cover_sheet::{CoverSheetExtractor, CoverSheetSignals};
pub use unit_schedule::{UnitScheduleExtractor, UnitScheduleSignals};
pub use zoning::{ZoningExtractor, ZoningSignals};

use planfact_core::types::page::PageText;

/// A short excerpt around a match, flattened to one line.
pub(crate) fn snippet_around(text: &str, start: usize, end: usize) -> String {
    const RADIUS: usize = 60;
    let from = text[..start]
        .char_indices()
        .rev()
        .take(RADIUS)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .take(RADIUS + 1)
        .last()
        .map(|(i, c)| end + i + c.len_utf8())
        .unwrap_or(end);
    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a number that may carry thousands separators ("14,250.5").
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse::<f64>().ok()
}

/// The page scope an extractor settled on: focused pages at full confidence,
/// or the whole document at fallback confidence.
pub(crate) struct PageScope<'a> {
    pub pages: Vec<&'a PageText>,
    pub confidence: f32,
}

pub(crate) fn scope_pages<'a>(
    pages: &'a [PageText],
    focused: Vec<&'a PageText>,
    focused_confidence: f32,
    fallback_confidence: f32,
) -> PageScope<'a> {
    if focused.is_empty() {
        PageScope {
            pages: pages.iter().collect(),
            confidence: fallback_confidence,
        }
    } else {
        PageScope {
            pages: focused,
            confidence: focused_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_flattens_whitespace() {
        let text = "PROJECT DATA\n\nPROPOSED 14 UNIT\nRESIDENTIAL BUILDING";
        let start = text.find("14").unwrap();
        let snippet = snippet_around(text, start, start + 2);
        assert!(snippet.contains("PROPOSED 14 UNIT"));
        assert!(!snippet.contains('\n'));
    }

    #[test]
    fn parse_number_handles_thousands_commas() {
        assert_eq!(parse_number("14,250"), Some(14250.0));
        assert_eq!(parse_number("3.85"), Some(3.85));
        assert_eq!(parse_number("n/a"), None);
    }
}
