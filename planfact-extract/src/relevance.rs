//! Page relevance classification and bounded selection for the LLM pass.
//!
//! Every page is scored against weighted keyword rules across five
//! categories. The top-scoring relevant pages are selected up to the policy
//! budget, and the selection is then topped up so that at least one page
//! from each structurally important category (cover sheet, zoning analysis,
//! unit schedule) is present, even if that page scored below the relevance
//! threshold.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use planfact_core::config::RelevancePolicy;
use planfact_core::types::page::PageText;
use planfact_core::types::result::{PageRelevance, RelevanceCategory};

/// Weighted keyword rules per category.
const UNIT_SCHEDULE_RULES: &[(&str, u32)] = &[
    ("UNIT SCHEDULE", 3),
    ("UNIT MIX", 3),
    ("SCHEDULE OF UNITS", 3),
    ("DWELLING UNIT", 2),
    ("APARTMENT", 1),
    ("BEDROOM", 1),
];

const ZONING_RULES: &[(&str, u32)] = &[
    ("ZONING ANALYSIS", 3),
    ("ZONING CALCULATIONS", 3),
    ("FLOOR AREA RATIO", 2),
    ("F.A.R", 2),
    ("LOT AREA", 2),
    ("ZONING DISTRICT", 2),
    ("USE GROUP", 2),
    ("SETBACK", 1),
    ("BULK", 1),
];

const COVER_RULES: &[(&str, u32)] = &[
    ("COVER SHEET", 3),
    ("TITLE SHEET", 3),
    ("PROJECT DATA", 2),
    ("DRAWING INDEX", 2),
    ("SHEET INDEX", 2),
    ("PROJECT INFORMATION", 1),
    ("SCOPE OF WORK", 1),
];

const AFFORDABLE_RULES: &[(&str, u32)] = &[
    ("AFFORDABLE HOUSING", 3),
    ("INCLUSIONARY", 3),
    ("MIH", 2),
    ("AMI", 2),
    ("AFFORDABLE", 1),
];

const FLOOR_PLAN_RULES: &[(&str, u32)] = &[
    ("FLOOR PLAN", 3),
    ("TYPICAL FLOOR", 2),
    ("ROOF PLAN", 1),
    ("CELLAR PLAN", 1),
    ("FOUNDATION PLAN", 1),
];

/// Categories whose presence in the selection is guaranteed.
const GUARANTEED: &[RelevanceCategory] = &[
    RelevanceCategory::CoverSheet,
    RelevanceCategory::ZoningAnalysis,
    RelevanceCategory::UnitSchedule,
];

/// A category's score counts toward the page's category list at this level.
const CATEGORY_MEMBERSHIP: u32 = 2;

struct CategoryRules {
    category: RelevanceCategory,
    automaton: AhoCorasick,
    weights: Vec<u32>,
}

pub struct RelevanceClassifier {
    policy: RelevancePolicy,
    rules: Vec<CategoryRules>,
}

impl RelevanceClassifier {
    pub fn new(policy: RelevancePolicy) -> Self {
        let rules = vec![
            build(RelevanceCategory::UnitSchedule, UNIT_SCHEDULE_RULES),
            build(RelevanceCategory::ZoningAnalysis, ZONING_RULES),
            build(RelevanceCategory::CoverSheet, COVER_RULES),
            build(RelevanceCategory::AffordableHousing, AFFORDABLE_RULES),
            build(RelevanceCategory::FloorPlan, FLOOR_PLAN_RULES),
        ];
        Self { policy, rules }
    }

    /// Score all pages and mark the bounded selection for the LLM pass.
    pub fn classify(&self, pages: &[PageText]) -> Vec<PageRelevance> {
        let mut results: Vec<PageRelevance> = Vec::with_capacity(pages.len());
        // Per-page per-category scores, kept for the guarantee top-up.
        let mut category_scores: Vec<Vec<(RelevanceCategory, u32)>> = Vec::with_capacity(pages.len());

        for page in pages {
            let mut per_category = Vec::with_capacity(self.rules.len());
            let mut total = 0u32;
            let mut categories = Vec::new();
            for rule in &self.rules {
                let score = rule_score(rule, &page.text);
                total += score;
                if score >= CATEGORY_MEMBERSHIP {
                    categories.push(rule.category);
                }
                per_category.push((rule.category, score));
            }
            results.push(PageRelevance {
                page: page.page_index,
                score: total,
                categories,
                selected: false,
            });
            category_scores.push(per_category);
        }

        // Top-scoring relevant pages, stable by page order on ties.
        let mut ranked: Vec<usize> = (0..results.len())
            .filter(|&i| results[i].score >= self.policy.relevance_threshold)
            .collect();
        ranked.sort_by(|&a, &b| results[b].score.cmp(&results[a].score).then(a.cmp(&b)));
        for &i in ranked.iter().take(self.policy.max_llm_pages) {
            results[i].selected = true;
        }

        // Guarantee structurally important categories, below threshold if
        // need be.
        for &category in GUARANTEED {
            let covered = results
                .iter()
                .any(|r| r.selected && r.categories.contains(&category));
            if covered {
                continue;
            }
            let best = (0..results.len())
                .filter_map(|i| {
                    let (_, score) = category_scores[i]
                        .iter()
                        .find(|(c, _)| *c == category)
                        .copied()?;
                    (score > 0).then_some((i, score))
                })
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)));
            if let Some((i, _)) = best {
                results[i].selected = true;
                if !results[i].categories.contains(&category) {
                    results[i].categories.push(category);
                }
            }
        }

        results
    }

    /// The pages picked for the LLM pass, in document order.
    pub fn selected_pages<'a>(
        &self,
        relevance: &[PageRelevance],
        pages: &'a [PageText],
    ) -> Vec<&'a PageText> {
        relevance
            .iter()
            .filter(|r| r.selected)
            .filter_map(|r| pages.iter().find(|p| p.page_index == r.page))
            .collect()
    }
}

fn build(category: RelevanceCategory, rules: &[(&str, u32)]) -> CategoryRules {
    let automaton = AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(rules.iter().map(|(k, _)| *k))
        .expect("static keyword set");
    CategoryRules {
        category,
        automaton,
        weights: rules.iter().map(|(_, w)| *w).collect(),
    }
}

/// Sum of weights of the distinct keywords present.
fn rule_score(rule: &CategoryRules, text: &str) -> u32 {
    let mut seen = vec![false; rule.weights.len()];
    for m in rule.automaton.find_iter(text) {
        seen[m.pattern().as_usize()] = true;
    }
    seen.iter()
        .zip(&rule.weights)
        .filter(|(hit, _)| **hit)
        .map(|(_, w)| *w)
        .sum()
}
