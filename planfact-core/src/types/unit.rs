//! Per-unit records and the aggregated unit mix.

use serde::{Deserialize, Serialize};

/// Bedroom count classification for a dwelling unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedroomType {
    Studio,
    OneBr,
    TwoBr,
    ThreePlusBr,
    Unknown,
}

impl BedroomType {
    /// Parse a type-column cell ("STUDIO", "1BR", "2 BR", "3BR+", ...).
    pub fn parse(cell: &str) -> Self {
        let upper = cell.trim().to_ascii_uppercase();
        if upper.contains("STUDIO") || upper.starts_with("0BR") || upper.starts_with("0 BR") {
            return Self::Studio;
        }
        let digits: String = upper.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u32>() {
            Ok(1) => Self::OneBr,
            Ok(2) => Self::TwoBr,
            Ok(n) if n >= 3 => Self::ThreePlusBr,
            _ => Self::Unknown,
        }
    }
}

/// A single dwelling unit as observed in a unit schedule or LLM output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Canonical (uppercased) unit identifier, e.g. "2A", "PH1".
    pub unit_id: String,
    pub bedroom_type: BedroomType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
}

/// Counts of units per bedroom type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMix {
    pub studio: u32,
    pub one_br: u32,
    pub two_br: u32,
    pub three_plus_br: u32,
    pub unknown: u32,
}

impl UnitMix {
    /// Tally a set of unit records into a mix.
    pub fn from_records(records: &[UnitRecord]) -> Self {
        let mut mix = Self::default();
        for record in records {
            match record.bedroom_type {
                BedroomType::Studio => mix.studio += 1,
                BedroomType::OneBr => mix.one_br += 1,
                BedroomType::TwoBr => mix.two_br += 1,
                BedroomType::ThreePlusBr => mix.three_plus_br += 1,
                BedroomType::Unknown => mix.unknown += 1,
            }
        }
        mix
    }

    pub fn total(&self) -> u32 {
        self.studio + self.one_br + self.two_br + self.three_plus_br + self.unknown
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bedroom_type_parses_common_cells() {
        assert_eq!(BedroomType::parse("STUDIO"), BedroomType::Studio);
        assert_eq!(BedroomType::parse("studio"), BedroomType::Studio);
        assert_eq!(BedroomType::parse("1BR"), BedroomType::OneBr);
        assert_eq!(BedroomType::parse("2 BR"), BedroomType::TwoBr);
        assert_eq!(BedroomType::parse("3BR"), BedroomType::ThreePlusBr);
        assert_eq!(BedroomType::parse("4 BEDROOM"), BedroomType::ThreePlusBr);
        assert_eq!(BedroomType::parse("DUPLEX"), BedroomType::Unknown);
    }

    #[test]
    fn unit_mix_tallies_records() {
        let records = vec![
            UnitRecord { unit_id: "1A".into(), bedroom_type: BedroomType::Studio, floor: Some(1) },
            UnitRecord { unit_id: "1B".into(), bedroom_type: BedroomType::TwoBr, floor: Some(1) },
            UnitRecord { unit_id: "2A".into(), bedroom_type: BedroomType::TwoBr, floor: Some(2) },
        ];
        let mix = UnitMix::from_records(&records);
        assert_eq!(mix.studio, 1);
        assert_eq!(mix.two_br, 2);
        assert_eq!(mix.total(), 3);
    }
}
