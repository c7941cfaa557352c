//! Semantic table classification from header keywords and sample rows.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use planfact_core::types::table::{ClassifiedTable, TableType};

use super::reconstruct::RawTable;

const LIGHT_VENT_KEYWORDS: &[&str] = &[
    "LIGHT",
    "VENTILATION",
    "VENT",
    "GLAZING",
    "OPERABLE",
    "SF REQUIRED",
    "SF PROVIDED",
    "WINDOW",
];

const UNIT_SCHEDULE_KEYWORDS: &[&str] = &[
    "UNIT",
    "APT",
    "APARTMENT",
    "DWELLING",
    "BR",
    "BED",
    "TYPE",
    "NET SF",
    "GROSS SF",
    "RENT",
];

const ZONING_KEYWORDS: &[&str] = &[
    "ZONING",
    "ZONE",
    "FAR",
    "FLOOR AREA RATIO",
    "LOT AREA",
    "YARD",
    "SETBACK",
    "REQUIRED",
    "PERMITTED",
    "ALLOWED",
    "PROPOSED",
];

const OCCUPANCY_KEYWORDS: &[&str] = &[
    "OCCUPANCY",
    "OCCUPANT",
    "LOAD",
    "EGRESS",
    "EXIT",
    "CAPACITY",
];

/// Added to the unit-schedule score when affordability language shows up;
/// affordable unit schedules often lead with program terms instead of
/// "UNIT".
const AFFORDABILITY_KEYWORDS: &[&str] = &["AFFORDABLE", "AMI", "MIH", "INCLUSIONARY", "RENT STABILIZED"];

/// Canonical room names. Rows full of these identify a light/ventilation
/// schedule even under a misleading header, which happens often enough that
/// row evidence deliberately outranks header evidence.
const ROOM_TOKENS: &[&str] = &[
    "BEDROOM",
    "KITCHEN",
    "LIVING",
    "LIVING ROOM",
    "BATH",
    "BATHROOM",
    "DINING",
    "STUDY",
    "DEN",
];

/// Body rows sampled for the room-token override.
const ROOM_SAMPLE_ROWS: usize = 5;
/// Distinct sampled rows that must contain a room token to force the override.
const ROOM_ROW_QUORUM: usize = 2;
/// Confidence of the forced override.
const ROOM_OVERRIDE_CONFIDENCE: f32 = 0.95;

pub struct TableClassifier {
    light_vent: AhoCorasick,
    unit_schedule: AhoCorasick,
    zoning: AhoCorasick,
    occupancy: AhoCorasick,
    affordability: AhoCorasick,
    room_tokens: AhoCorasick,
}

impl TableClassifier {
    pub fn new() -> Self {
        Self {
            light_vent: build(LIGHT_VENT_KEYWORDS),
            unit_schedule: build(UNIT_SCHEDULE_KEYWORDS),
            zoning: build(ZONING_KEYWORDS),
            occupancy: build(OCCUPANCY_KEYWORDS),
            affordability: build(AFFORDABILITY_KEYWORDS),
            room_tokens: build(ROOM_TOKENS),
        }
    }

    /// Classify one reconstructed table.
    pub fn classify(&self, table: RawTable) -> ClassifiedTable {
        // Row override first: ≥2 of the first 5 body rows naming rooms is a
        // stronger signal than any header.
        let room_rows = table
            .rows
            .iter()
            .take(ROOM_SAMPLE_ROWS)
            .filter(|row| {
                let joined = row.join(" ");
                self.room_tokens.find(&joined).is_some()
            })
            .count();
        if room_rows >= ROOM_ROW_QUORUM {
            return finish(table, TableType::LightVentilationSchedule, ROOM_OVERRIDE_CONFIDENCE);
        }

        let header = table.headers.join(" ");
        let mut scores = [
            (TableType::LightVentilationSchedule, distinct_hits(&self.light_vent, &header)),
            (TableType::UnitSchedule, distinct_hits(&self.unit_schedule, &header)),
            (TableType::ZoningTable, distinct_hits(&self.zoning, &header)),
            (TableType::OccupancyLoad, distinct_hits(&self.occupancy, &header)),
        ];
        scores[1].1 += distinct_hits(&self.affordability, &header);

        // First-listed type wins ties.
        let (best_type, best_score) = scores
            .iter()
            .copied()
            .fold((TableType::Unknown, 0usize), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });

        match best_score {
            s if s >= 2 => finish(table, best_type, 0.8),
            1 => finish(table, best_type, 0.5),
            _ => finish(table, TableType::Unknown, 0.0),
        }
    }
}

impl Default for TableClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn build(keywords: &[&str]) -> AhoCorasick {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(keywords)
        .expect("static keyword set")
}

/// Distinct patterns from the set present in the text.
fn distinct_hits(automaton: &AhoCorasick, text: &str) -> usize {
    let mut seen = std::collections::HashSet::new();
    for m in automaton.find_iter(text) {
        seen.insert(m.pattern().as_usize());
    }
    seen.len()
}

fn finish(table: RawTable, table_type: TableType, confidence: f32) -> ClassifiedTable {
    ClassifiedTable {
        table_type,
        confidence,
        page_index: table.page_index,
        table_index: table.table_index,
        headers: table.headers,
        rows: table.rows,
    }
}
