//! Resolution engine: merge independent signals per field into one
//! resolved value with agreement-boosted confidence, plus the redundancy
//! score measuring cross-source corroboration.

use planfact_core::config::{RedundancyPolicy, ResolutionPolicy};
use planfact_core::types::signal::{Signal, SourceType, UnitCountMention};

/// Outcome of resolving the total-unit-count field.
#[derive(Debug, Default)]
pub struct UnitResolution {
    pub total_units: Option<Signal<u32>>,
    pub warnings: Vec<String>,
}

pub struct Resolver {
    policy: ResolutionPolicy,
    redundancy: RedundancyPolicy,
}

impl Resolver {
    pub fn new(policy: ResolutionPolicy, redundancy: RedundancyPolicy) -> Self {
        Self { policy, redundancy }
    }

    /// Merge up to three weighted unit-count candidates.
    ///
    /// Source weights multiply into each candidate's own confidence. A lone
    /// candidate is capped; one source is never trusted on its own. With
    /// several candidates, agreeing pairs are boosted and a suspicious high
    /// outlier (max > ratio × min while min is small) is penalized.
    pub fn resolve_units(
        &self,
        candidates: Vec<(SourceType, Signal<u32>)>,
    ) -> UnitResolution {
        let mut resolution = UnitResolution::default();
        if candidates.is_empty() {
            return resolution;
        }

        let mut weighted: Vec<(SourceType, Signal<u32>)> = candidates
            .into_iter()
            .map(|(source, mut signal)| {
                signal.set_confidence(signal.confidence * self.source_weight(source));
                (source, signal)
            })
            .collect();

        if weighted.len() == 1 {
            let (_, mut signal) = weighted.pop().expect("checked length");
            signal.set_confidence(signal.confidence.min(self.policy.single_source_cap));
            resolution.total_units = Some(signal);
            return resolution;
        }

        // Agreement reward: every pair within the window boosts both members.
        let window = self.policy.agreement_window;
        let values: Vec<u32> = weighted.iter().map(|(_, s)| s.value).collect();
        let mut boosts = vec![0.0f32; weighted.len()];
        for i in 0..values.len() {
            for j in (i + 1)..values.len() {
                if values[i].abs_diff(values[j]) <= window {
                    boosts[i] += self.policy.agreement_boost;
                    boosts[j] += self.policy.agreement_boost;
                }
            }
        }
        for ((_, signal), boost) in weighted.iter_mut().zip(&boosts) {
            signal.set_confidence(signal.confidence + boost);
        }

        // Outlier suspicion: a small low-confidence count wildly exceeded by
        // another source penalizes the high value, not the low one.
        let max_value = *values.iter().max().expect("non-empty");
        let min_value = *values.iter().min().expect("non-empty");
        if max_value as f64 > self.policy.outlier_ratio * min_value as f64
            && min_value < self.policy.outlier_low_ceiling
        {
            let max_idx = weighted
                .iter()
                .position(|(_, s)| s.value == max_value)
                .expect("max exists");
            let min_idx = weighted
                .iter()
                .position(|(_, s)| s.value == min_value)
                .expect("min exists");
            let (max_source, min_source) = (weighted[max_idx].0, weighted[min_idx].0);
            let penalized = weighted[max_idx].1.confidence - self.policy.outlier_penalty;
            weighted[max_idx].1.set_confidence(penalized);
            resolution.warnings.push(format!(
                "unit count {max_value} ({max_source}) exceeds {min_value} ({min_source}) by more than \
                 {}x; treating the high value as suspect",
                self.policy.outlier_ratio
            ));
        }

        // Highest adjusted confidence wins; agreeing runners-up contribute
        // their evidence to the winner.
        let winner_idx = weighted
            .iter()
            .enumerate()
            .max_by(|(_, (_, a)), (_, (_, b))| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .expect("non-empty");

        let winner_value = weighted[winner_idx].1.value;
        let mut winner = weighted.swap_remove(winner_idx).1;
        for (_, other) in weighted {
            if other.value.abs_diff(winner_value) <= window {
                for ev in other.evidence {
                    winner.push_evidence(ev);
                }
            }
        }
        resolution.total_units = Some(winner);
        resolution
    }

    /// Redundancy score and the count of distinct corroborating
    /// (source, page) pairs among mentions within the agreement window of
    /// the resolved value.
    pub fn redundancy(&self, resolved: u32, mentions: &[UnitCountMention]) -> (f32, usize) {
        let window = self.policy.agreement_window;
        let mut pairs = std::collections::HashSet::new();
        for mention in mentions {
            if mention.value.abs_diff(resolved) <= window {
                pairs.insert((mention.source, mention.page));
            }
        }
        (self.redundancy.score(pairs.len()), pairs.len())
    }

    /// Extra confidence when three or more distinct sources corroborate.
    pub fn corroboration_boost(&self, distinct_sources: usize) -> f32 {
        if distinct_sources >= 3 {
            self.policy.corroboration_boost
        } else {
            0.0
        }
    }

    fn source_weight(&self, source: SourceType) -> f32 {
        match source {
            SourceType::CoverSheet => self.policy.cover_sheet_weight,
            SourceType::ZoningText => self.policy.zoning_text_weight,
            SourceType::Table => self.policy.table_weight,
            SourceType::Ocr | SourceType::Llm => 1.0,
        }
    }
}

/// Prefer the primary signal, falling back to the secondary when the
/// primary extractor found nothing.
pub fn merge_field<T>(primary: Option<Signal<T>>, fallback: Option<Signal<T>>) -> Option<Signal<T>> {
    primary.or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planfact_core::types::signal::Evidence;

    fn signal(value: u32, confidence: f32, source: SourceType) -> (SourceType, Signal<u32>) {
        (
            source,
            Signal::new(
                value,
                confidence,
                Evidence::from_text(0, format!("UNITS {value}"), source, confidence),
            ),
        )
    }

    fn resolver() -> Resolver {
        Resolver::new(ResolutionPolicy::default(), RedundancyPolicy::default())
    }

    #[test]
    fn single_candidate_is_capped() {
        let resolution = resolver().resolve_units(vec![signal(14, 0.9, SourceType::CoverSheet)]);
        let units = resolution.total_units.unwrap();
        assert_eq!(units.value, 14);
        assert!(units.confidence <= 0.6);
    }

    #[test]
    fn agreeing_pair_is_boosted_and_merged() {
        let resolution = resolver().resolve_units(vec![
            signal(14, 0.9, SourceType::CoverSheet),
            signal(14, 0.9, SourceType::ZoningText),
        ]);
        let units = resolution.total_units.unwrap();
        assert_eq!(units.value, 14);
        // 0.9 * 0.9 + 0.1 = 0.91
        assert!(units.confidence >= 0.85);
        assert_eq!(units.evidence.len(), 2, "runner-up evidence is merged");
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn near_agreement_within_window_counts() {
        let resolution = resolver().resolve_units(vec![
            signal(14, 0.9, SourceType::CoverSheet),
            signal(16, 0.9, SourceType::Table),
        ]);
        let units = resolution.total_units.unwrap();
        assert!(units.confidence > 0.8, "±2 still counts as agreement");
    }

    #[test]
    fn high_outlier_is_penalized_and_low_value_wins() {
        let resolution = resolver().resolve_units(vec![
            signal(14, 0.7, SourceType::CoverSheet),
            signal(150, 0.6, SourceType::ZoningText),
        ]);
        let units = resolution.total_units.unwrap();
        assert_eq!(units.value, 14, "the low candidate wins");
        assert_eq!(resolution.warnings.len(), 1);
        let warning = &resolution.warnings[0];
        assert!(warning.contains("150") && warning.contains("14"));
        assert!(warning.contains("cover_sheet") && warning.contains("zoning_text"));
    }

    #[test]
    fn outlier_rule_leaves_large_counts_alone() {
        // min 40 ≥ 30: two big disagreeing counts are not outlier-penalized.
        let resolution = resolver().resolve_units(vec![
            signal(40, 0.9, SourceType::CoverSheet),
            signal(90, 0.9, SourceType::ZoningText),
        ]);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn redundancy_counts_distinct_source_page_pairs() {
        let resolver = resolver();
        let mention = |value, page, source| UnitCountMention {
            value,
            page,
            source,
            snippet: String::new(),
            confidence: 0.8,
        };
        assert_eq!(resolver.redundancy(14, &[]).0, 0.0);
        let one = vec![mention(14, 0, SourceType::CoverSheet)];
        assert_eq!(resolver.redundancy(14, &one).0, 0.6);
        let two = vec![
            mention(14, 0, SourceType::CoverSheet),
            mention(13, 4, SourceType::ZoningText),
        ];
        assert_eq!(resolver.redundancy(14, &two).0, 0.85);
        let three = vec![
            mention(14, 0, SourceType::CoverSheet),
            mention(13, 4, SourceType::ZoningText),
            mention(15, 6, SourceType::Table),
            mention(14, 0, SourceType::CoverSheet), // duplicate pair
            mention(99, 2, SourceType::Table),      // outside the window
        ];
        let (score, distinct) = resolver.redundancy(14, &three);
        assert_eq!(score, 0.95);
        assert_eq!(distinct, 3);
    }
}
