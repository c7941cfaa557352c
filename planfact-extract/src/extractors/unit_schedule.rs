//! Table-derived unit counts.
//!
//! Instead of pattern-matching prose, this extractor counts distinct,
//! validated unit identifiers across all classified unit-schedule tables.
//! Identifiers are deduplicated case-insensitively; bedroom type comes from
//! a type column when one exists, else the record carries `Unknown`.

use regex::Regex;

use planfact_core::config::ExtractorPolicy;
use planfact_core::types::signal::{Evidence, Signal, SourceType, UnitCountMention};
use planfact_core::types::table::{ClassifiedTable, TableType};
use planfact_core::types::unit::{BedroomType, UnitMix, UnitRecord};

#[derive(Debug, Default)]
pub struct UnitScheduleSignals {
    pub total_units: Option<Signal<u32>>,
    pub unit_mix: Option<Signal<UnitMix>>,
    pub records: Vec<UnitRecord>,
    pub mentions: Vec<UnitCountMention>,
}

pub struct UnitScheduleExtractor {
    policy: ExtractorPolicy,
    unit_id: Regex,
}

impl UnitScheduleExtractor {
    pub fn new(policy: ExtractorPolicy) -> Self {
        Self {
            policy,
            // "2A", "12C", "PH1", "101", "B-2": short alphanumeric tags with
            // at least one digit.
            unit_id: Regex::new(r"^(?:PH\d{0,2}[A-Z]?|[A-Z]?\d{1,3}[A-Z]{0,2}|[A-Z]-?\d{1,3})$")
                .unwrap(),
        }
    }

    pub fn extract(&self, tables: &[ClassifiedTable]) -> UnitScheduleSignals {
        let schedules: Vec<&ClassifiedTable> = tables
            .iter()
            .filter(|t| t.table_type == TableType::UnitSchedule)
            .collect();
        if schedules.is_empty() {
            return UnitScheduleSignals::default();
        }

        let mut seen = std::collections::HashSet::new();
        let mut records = Vec::new();
        let mut mentions = Vec::new();
        let mut evidences: Vec<Evidence> = Vec::new();
        let mut confidence = 0.0f32;

        for table in &schedules {
            let id_col = find_column(&table.headers, &["UNIT", "APT", "APARTMENT", "NO"]).unwrap_or(0);
            let type_col = find_column(&table.headers, &["TYPE", "BR", "BED", "LAYOUT"]);
            let floor_col = find_column(&table.headers, &["FLOOR", "STORY", "LEVEL"]);

            let mut table_count = 0u32;
            for row in &table.rows {
                let Some(raw_id) = row.get(id_col) else {
                    continue;
                };
                let id = raw_id.trim().to_ascii_uppercase();
                if !self.unit_id.is_match(&id) || !seen.insert(id.clone()) {
                    continue;
                }
                table_count += 1;
                let bedroom_type = type_col
                    .and_then(|c| row.get(c))
                    .map(|cell| BedroomType::parse(cell))
                    .unwrap_or(BedroomType::Unknown);
                let floor = floor_col
                    .and_then(|c| row.get(c))
                    .and_then(|cell| cell.trim().parse::<i32>().ok());
                records.push(UnitRecord {
                    unit_id: id,
                    bedroom_type,
                    floor,
                });
            }

            if table_count > 0 {
                confidence = confidence.max(table.confidence);
                let snippet = format!(
                    "{} distinct unit identifiers in {} table (page {})",
                    table_count,
                    table.table_type,
                    table.page_index
                );
                evidences.push(Evidence::from_table(
                    table.page_index,
                    snippet.clone(),
                    table.confidence,
                    table.table_type,
                    table.table_index,
                ));
                mentions.push(UnitCountMention {
                    value: table_count,
                    page: table.page_index,
                    source: SourceType::Table,
                    snippet,
                    confidence: table.confidence,
                });
            }
        }

        let total = records.len() as u32;
        if total == 0 || !self.policy.units_in_range(total) {
            return UnitScheduleSignals::default();
        }

        let mut evidences = evidences.into_iter();
        let mut total_signal = Signal::new(
            total,
            confidence,
            evidences.next().expect("at least one counted table"),
        );
        // Further schedules corroborate the same count.
        for ev in evidences {
            total_signal.push_evidence(ev);
        }

        let mix = UnitMix::from_records(&records);
        let unit_mix = (!mix.is_empty()).then(|| {
            Signal::new(
                mix,
                confidence,
                Evidence::from_table(
                    total_signal.evidence[0].page,
                    format!("bedroom mix tallied from {} unit records", records.len()),
                    confidence,
                    TableType::UnitSchedule,
                    total_signal.evidence[0].table_index.unwrap_or(0),
                ),
            )
        });

        UnitScheduleSignals {
            total_units: Some(total_signal),
            unit_mix,
            records,
            mentions,
        }
    }
}

/// Index of the first header containing any of the given tokens.
fn find_column(headers: &[String], tokens: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let upper = h.to_ascii_uppercase();
        tokens.iter().any(|t| upper.contains(t))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(headers: &[&str], rows: &[&[&str]]) -> ClassifiedTable {
        ClassifiedTable {
            table_type: TableType::UnitSchedule,
            confidence: 0.8,
            page_index: 3,
            table_index: 0,
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn counts_distinct_unit_ids_case_insensitively() {
        let table = schedule(
            &["UNIT", "TYPE", "NET SF"],
            &[
                &["1A", "STUDIO", "480"],
                &["1a", "STUDIO", "480"],
                &["2A", "1BR", "610"],
                &["TOTAL", "", "1090"],
            ],
        );
        let signals = UnitScheduleExtractor::new(ExtractorPolicy::default()).extract(&[table]);
        let units = signals.total_units.unwrap();
        assert_eq!(units.value, 2, "duplicate and non-id rows are skipped");
        assert_eq!(units.evidence[0].table_type, Some(TableType::UnitSchedule));
        let mix = signals.unit_mix.unwrap().value;
        assert_eq!(mix.studio, 1);
        assert_eq!(mix.one_br, 1);
    }

    #[test]
    fn missing_type_column_yields_unknown_bedrooms() {
        let table = schedule(&["UNIT", "NET SF"], &[&["1A", "480"], &["1B", "520"]]);
        let signals = UnitScheduleExtractor::new(ExtractorPolicy::default()).extract(&[table]);
        assert!(signals
            .records
            .iter()
            .all(|r| r.bedroom_type == BedroomType::Unknown));
        assert_eq!(signals.unit_mix.unwrap().value.unknown, 2);
    }

    #[test]
    fn ids_deduplicate_across_tables() {
        let first = schedule(&["UNIT", "TYPE"], &[&["1A", "STUDIO"], &["1B", "1BR"]]);
        let mut second = schedule(&["UNIT", "TYPE"], &[&["1B", "1BR"], &["2A", "2BR"]]);
        second.page_index = 4;
        let signals =
            UnitScheduleExtractor::new(ExtractorPolicy::default()).extract(&[first, second]);
        assert_eq!(signals.total_units.unwrap().value, 3);
        assert_eq!(signals.mentions.len(), 2);
    }

    #[test]
    fn ignores_non_schedule_tables() {
        let mut table = schedule(&["UNIT", "TYPE"], &[&["1A", "STUDIO"]]);
        table.table_type = TableType::ZoningTable;
        let signals = UnitScheduleExtractor::new(ExtractorPolicy::default()).extract(&[table]);
        assert!(signals.total_units.is_none());
    }
}
