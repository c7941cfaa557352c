//! Zoning-text pattern extractor.
//!
//! Works the zoning analysis: dwelling unit totals, lot area, FAR, and the
//! zoning district, restricted to zoning-keyword-dense pages when any exist.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use regex::Regex;

use planfact_core::config::ExtractorPolicy;
use planfact_core::types::page::PageText;
use planfact_core::types::signal::{Evidence, Signal, SourceType, UnitCountMention};

use super::{parse_number, scope_pages, snippet_around, PageScope};

const ZONING_MARKERS: &[&str] = &[
    "ZONING ANALYSIS",
    "ZONING CALCULATIONS",
    "ZONING DISTRICT",
    "FLOOR AREA RATIO",
    "LOT AREA",
    "USE GROUP",
    "BULK",
    "SETBACK",
    "YARD",
];

/// A page is zoning-dense at this many distinct marker hits.
const DENSITY_THRESHOLD: usize = 3;

#[derive(Debug, Default)]
pub struct ZoningSignals {
    pub total_units: Option<Signal<u32>>,
    pub lot_area_sf: Option<Signal<f64>>,
    pub floor_area_ratio: Option<Signal<f64>>,
    pub zoning_district: Option<Signal<String>>,
    pub mentions: Vec<UnitCountMention>,
}

pub struct ZoningExtractor {
    policy: ExtractorPolicy,
    markers: AhoCorasick,
    unit_patterns: Vec<Regex>,
    lot_area_patterns: Vec<Regex>,
    far_patterns: Vec<Regex>,
    zone_patterns: Vec<Regex>,
}

impl ZoningExtractor {
    pub fn new(policy: ExtractorPolicy) -> Self {
        let markers = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(ZONING_MARKERS)
            .expect("static marker set");
        Self {
            policy,
            markers,
            unit_patterns: compile(&[
                r"(?i)\bTOTAL\s+DWELLING\s+UNITS\s*[:=\-]?\s*(\d{1,3})\b",
                r"(?i)\bDWELLING\s+UNITS\s*(?:PROPOSED|PROVIDED)?\s*[:=\-]\s*(\d{1,3})\b",
                r"(?i)\bMAX(?:IMUM)?\s+(?:NO\.?|NUMBER)\s+OF\s+DWELLING\s+UNITS?\s*[:=\-]?\s*(\d{1,3})\b",
            ]),
            lot_area_patterns: compile(&[
                r"(?i)\bLOT\s+AREA\s*[:=\-]?\s*([\d,]+(?:\.\d+)?)\s*(?:SQ\.?\s*FT\.?|S\.?F\.?)",
                r"(?i)\bAREA\s+OF\s+(?:ZONING\s+)?LOT\s*[:=\-]?\s*([\d,]+(?:\.\d+)?)",
            ]),
            far_patterns: compile(&[
                r"(?i)\bPROPOSED\s+F\.?A\.?R\.?\s*[:=\-]?\s*(\d{1,2}(?:\.\d+)?)\b",
                r"(?i)\bFLOOR\s+AREA\s+RATIO\s*(?:\(FAR\))?\s*[:=\-]?\s*(\d{1,2}(?:\.\d+)?)\b",
                r"(?i)\bF\.?A\.?R\.?\s*[:=\-]?\s*(\d{1,2}(?:\.\d+)?)\b",
            ]),
            zone_patterns: compile(&[
                r"(?i)\bZONING\s+DISTRICT\s*[:=\-]?\s*([A-Z]\d[0-9A-Z]*(?:-[0-9A-Z]+)?)",
                r"(?i)\bDISTRICT\s*[:=\-]\s*([A-Z]\d[0-9A-Z]*(?:-[0-9A-Z]+)?)",
            ]),
        }
    }

    pub fn extract(&self, pages: &[PageText]) -> ZoningSignals {
        let focused: Vec<&PageText> = pages
            .iter()
            .filter(|p| self.density(&p.text) >= DENSITY_THRESHOLD)
            .collect();
        let scope = scope_pages(
            pages,
            focused,
            self.policy.focused_confidence,
            self.policy.fallback_confidence,
        );

        let mut signals = ZoningSignals {
            total_units: self.first_count(&scope, &self.unit_patterns),
            lot_area_sf: self.first_float(&scope, &self.lot_area_patterns, |v| {
                v > 0.0 && v < 1_000_000.0
            }),
            floor_area_ratio: self.first_float(&scope, &self.far_patterns, |v| {
                self.policy.far_in_range(v)
            }),
            zoning_district: self.first_string(&scope, &self.zone_patterns),
            mentions: Vec::new(),
        };
        signals.mentions = self.unit_mentions(&scope);
        signals
    }

    fn density(&self, text: &str) -> usize {
        let mut seen = std::collections::HashSet::new();
        for m in self.markers.find_iter(text) {
            seen.insert(m.pattern().as_usize());
        }
        seen.len()
    }

    fn first_count(&self, scope: &PageScope<'_>, patterns: &[Regex]) -> Option<Signal<u32>> {
        for pattern in patterns {
            for page in &scope.pages {
                for captures in pattern.captures_iter(&page.text) {
                    let (Some(whole), Some(m)) = (captures.get(0), captures.get(1)) else {
                        continue;
                    };
                    let Ok(value) = m.as_str().parse::<u32>() else {
                        continue;
                    };
                    if !self.policy.units_in_range(value) {
                        continue;
                    }
                    let snippet = snippet_around(&page.text, whole.start(), whole.end());
                    return Some(Signal::new(
                        value,
                        scope.confidence,
                        Evidence::from_text(page.page_index, snippet, SourceType::ZoningText, scope.confidence),
                    ));
                }
            }
        }
        None
    }

    fn first_float(
        &self,
        scope: &PageScope<'_>,
        patterns: &[Regex],
        in_range: impl Fn(f64) -> bool,
    ) -> Option<Signal<f64>> {
        for pattern in patterns {
            for page in &scope.pages {
                for captures in pattern.captures_iter(&page.text) {
                    let (Some(whole), Some(m)) = (captures.get(0), captures.get(1)) else {
                        continue;
                    };
                    let Some(value) = parse_number(m.as_str()) else {
                        continue;
                    };
                    if !in_range(value) {
                        continue;
                    }
                    let snippet = snippet_around(&page.text, whole.start(), whole.end());
                    return Some(Signal::new(
                        value,
                        scope.confidence,
                        Evidence::from_text(page.page_index, snippet, SourceType::ZoningText, scope.confidence),
                    ));
                }
            }
        }
        None
    }

    fn first_string(&self, scope: &PageScope<'_>, patterns: &[Regex]) -> Option<Signal<String>> {
        for pattern in patterns {
            for page in &scope.pages {
                if let Some(captures) = pattern.captures(&page.text) {
                    let (Some(whole), Some(m)) = (captures.get(0), captures.get(1)) else {
                        continue;
                    };
                    let snippet = snippet_around(&page.text, whole.start(), whole.end());
                    return Some(Signal::new(
                        m.as_str().to_ascii_uppercase(),
                        scope.confidence,
                        Evidence::from_text(page.page_index, snippet, SourceType::ZoningText, scope.confidence),
                    ));
                }
            }
        }
        None
    }

    fn unit_mentions(&self, scope: &PageScope<'_>) -> Vec<UnitCountMention> {
        let mut seen = std::collections::HashSet::new();
        let mut mentions = Vec::new();
        for page in &scope.pages {
            for pattern in &self.unit_patterns {
                for captures in pattern.captures_iter(&page.text) {
                    let (Some(whole), Some(m)) = (captures.get(0), captures.get(1)) else {
                        continue;
                    };
                    let Ok(value) = m.as_str().parse::<u32>() else {
                        continue;
                    };
                    if !self.policy.units_in_range(value) || !seen.insert((page.page_index, value)) {
                        continue;
                    }
                    mentions.push(UnitCountMention {
                        value,
                        page: page.page_index,
                        source: SourceType::ZoningText,
                        snippet: snippet_around(&page.text, whole.start(), whole.end()),
                        confidence: scope.confidence,
                    });
                }
            }
        }
        mentions
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<PageText> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| PageText::new(i, t.to_string(), false))
            .collect()
    }

    #[test]
    fn dense_zoning_page_is_preferred() {
        let docs = pages(&[
            "TOTAL DWELLING UNITS: 99",
            "ZONING ANALYSIS\nZONING DISTRICT: R6A\nLOT AREA: 14,250 SF\nFLOOR AREA RATIO: 3.44\nTOTAL DWELLING UNITS: 14",
        ]);
        let signals = ZoningExtractor::new(ExtractorPolicy::default()).extract(&docs);
        let units = signals.total_units.unwrap();
        assert_eq!(units.value, 14, "only the dense page is in scope");
        assert_eq!(units.confidence, 0.9);
        assert_eq!(signals.zoning_district.unwrap().value, "R6A");
        assert_eq!(signals.lot_area_sf.unwrap().value, 14250.0);
        assert_eq!(signals.floor_area_ratio.unwrap().value, 3.44);
    }

    #[test]
    fn whole_document_fallback_when_no_dense_page() {
        let docs = pages(&["GENERAL NOTES\nTOTAL DWELLING UNITS: 12"]);
        let signals = ZoningExtractor::new(ExtractorPolicy::default()).extract(&docs);
        let units = signals.total_units.unwrap();
        assert_eq!(units.value, 12);
        assert_eq!(units.confidence, 0.7);
    }
}
