//! Classified tables reconstructed from native text or OCR geometry.

use serde::{Deserialize, Serialize};

/// Semantic type of a reconstructed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    UnitSchedule,
    ZoningTable,
    LightVentilationSchedule,
    OccupancyLoad,
    Unknown,
}

impl TableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnitSchedule => "unit_schedule",
            Self::ZoningTable => "zoning_table",
            Self::LightVentilationSchedule => "light_ventilation_schedule",
            Self::OccupancyLoad => "occupancy_load",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table with its classification. Produced once per detected table,
/// read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedTable {
    pub table_type: TableType,
    pub confidence: f32,
    pub page_index: usize,
    /// Ordinal of this table among all tables detected on the page.
    pub table_index: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ClassifiedTable {
    /// Header cells joined for keyword scoring and snippets.
    pub fn header_text(&self) -> String {
        self.headers.join(" ")
    }
}
