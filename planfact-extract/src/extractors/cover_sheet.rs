//! Cover-sheet pattern extractor.
//!
//! Cover sheets carry the project data block: proposed unit count, story
//! count, site/lot area, FAR, and often the zoning district. Patterns are
//! ordered most-specific first; the first in-range match wins.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use regex::Regex;

use planfact_core::config::ExtractorPolicy;
use planfact_core::types::page::PageText;
use planfact_core::types::signal::{Evidence, Signal, SourceType, UnitCountMention};

use super::{parse_number, scope_pages, snippet_around, PageScope};

/// Markers identifying a cover/title sheet.
const COVER_MARKERS: &[&str] = &[
    "COVER SHEET",
    "TITLE SHEET",
    "PROJECT DATA",
    "SITE DATA",
    "PROJECT INFORMATION",
    "DRAWING INDEX",
    "SHEET INDEX",
    "SCOPE OF WORK",
];

/// Everything the cover-sheet extractor can produce.
#[derive(Debug, Default)]
pub struct CoverSheetSignals {
    pub total_units: Option<Signal<u32>>,
    pub floor_count: Option<Signal<u32>>,
    pub lot_area_sf: Option<Signal<f64>>,
    pub floor_area_ratio: Option<Signal<f64>>,
    pub zoning_district: Option<Signal<String>>,
    pub mentions: Vec<UnitCountMention>,
}

pub struct CoverSheetExtractor {
    policy: ExtractorPolicy,
    markers: AhoCorasick,
    unit_patterns: Vec<Regex>,
    floor_patterns: Vec<Regex>,
    lot_area_patterns: Vec<Regex>,
    far_patterns: Vec<Regex>,
    zone_patterns: Vec<Regex>,
}

impl CoverSheetExtractor {
    pub fn new(policy: ExtractorPolicy) -> Self {
        let markers = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(COVER_MARKERS)
            .expect("static marker set");
        Self {
            policy,
            markers,
            unit_patterns: compile(&[
                r"(?i)\bPROPOSED\s+(\d{1,3})\s+UNIT",
                r"(?i)\bTOTAL\s+(?:DWELLING\s+)?UNITS?\s*[:=\-]?\s*(\d{1,3})\b",
                r"(?i)\bNO\.?\s+OF\s+(?:DWELLING\s+)?UNITS?\s*[:=\-]?\s*(\d{1,3})\b",
                r"(?i)\b(\d{1,3})\s+DWELLING\s+UNITS?\b",
                r"(?i)\b(\d{1,3})\s+RESIDENTIAL\s+UNITS?\b",
            ]),
            floor_patterns: compile(&[
                r"(?i)\bNUMBER\s+OF\s+STORIES\s*[:=\-]?\s*(\d{1,2})\b",
                r"(?i)\b(\d{1,2})\s*-?\s*STOR(?:Y|IES)\b",
            ]),
            lot_area_patterns: compile(&[
                r"(?i)\bLOT\s+AREA\s*[:=\-]?\s*([\d,]+(?:\.\d+)?)\s*(?:SQ\.?\s*FT\.?|S\.?F\.?)",
                r"(?i)\bSITE\s+AREA\s*[:=\-]?\s*([\d,]+(?:\.\d+)?)\s*(?:SQ\.?\s*FT\.?|S\.?F\.?)",
            ]),
            far_patterns: compile(&[
                r"(?i)\bFLOOR\s+AREA\s+RATIO\s*(?:\(FAR\))?\s*[:=\-]?\s*(\d{1,2}(?:\.\d+)?)\b",
                r"(?i)\b(?:PROPOSED\s+)?F\.?A\.?R\.?\s*[:=\-]?\s*(\d{1,2}(?:\.\d+)?)\b",
            ]),
            zone_patterns: compile(&[
                r"(?i)\bZONING\s+DISTRICT\s*[:=\-]?\s*([A-Z]\d[0-9A-Z]*(?:-[0-9A-Z]+)?)",
                r"(?i)\bZONE\s*[:=\-]\s*([A-Z]\d[0-9A-Z]*(?:-[0-9A-Z]+)?)",
            ]),
        }
    }

    pub fn extract(&self, pages: &[PageText]) -> CoverSheetSignals {
        let focused: Vec<&PageText> = pages
            .iter()
            .filter(|p| self.markers.find(&p.text).is_some())
            .collect();
        let scope = scope_pages(
            pages,
            focused,
            self.policy.focused_confidence,
            self.policy.fallback_confidence,
        );

        let mut signals = CoverSheetSignals {
            total_units: self.first_count(&scope, &self.unit_patterns, |v| {
                self.policy.units_in_range(v)
            }),
            floor_count: self.first_count(&scope, &self.floor_patterns, |v| v >= 1 && v <= 60),
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

    fn first_count(
        &self,
        scope: &PageScope<'_>,
        patterns: &[Regex],
        in_range: impl Fn(u32) -> bool,
    ) -> Option<Signal<u32>> {
        for pattern in patterns {
            for page in &scope.pages {
                for captures in pattern.captures_iter(&page.text) {
                    let m = captures.get(1)?;
                    let Ok(value) = m.as_str().parse::<u32>() else {
                        continue;
                    };
                    if !in_range(value) {
                        continue;
                    }
                    let whole = captures.get(0)?;
                    let snippet = snippet_around(&page.text, whole.start(), whole.end());
                    return Some(Signal::new(
                        value,
                        scope.confidence,
                        Evidence::from_text(page.page_index, snippet, SourceType::CoverSheet, scope.confidence),
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
                    let m = captures.get(1)?;
                    let Some(value) = parse_number(m.as_str()) else {
                        continue;
                    };
                    if !in_range(value) {
                        continue;
                    }
                    let whole = captures.get(0)?;
                    let snippet = snippet_around(&page.text, whole.start(), whole.end());
                    return Some(Signal::new(
                        value,
                        scope.confidence,
                        Evidence::from_text(page.page_index, snippet, SourceType::CoverSheet, scope.confidence),
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
                    let m = captures.get(1)?;
                    let whole = captures.get(0)?;
                    let snippet = snippet_around(&page.text, whole.start(), whole.end());
                    return Some(Signal::new(
                        m.as_str().to_ascii_uppercase(),
                        scope.confidence,
                        Evidence::from_text(page.page_index, snippet, SourceType::CoverSheet, scope.confidence),
                    ));
                }
            }
        }
        None
    }

    /// Every in-range unit-count match becomes a mention, deduplicated per
    /// (page, value).
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
                        source: SourceType::CoverSheet,
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
