//! Pipeline configuration.
//!
//! Every confidence weight, boost, penalty, and threshold the pipeline uses
//! lives in one of these policy structs: a single source of truth, loadable
//! from TOML, each independently testable. Nothing in the pipeline crates
//! hard-codes a tuning constant.

mod cache;
mod extractor;
mod ocr;
mod reconcile;
mod relevance;
mod resolution;
mod validation;

pub use cache::CachePolicy;
pub use extractor::ExtractorPolicy;
pub use ocr::{IngestPolicy, OcrPolicy};
pub use reconcile::ReconcilePolicy;
pub use relevance::RelevancePolicy;
pub use resolution::{RedundancyPolicy, ResolutionPolicy};
pub use validation::ValidationPolicy;

use serde::{Deserialize, Serialize};

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub ingest: IngestPolicy,
    pub ocr: OcrPolicy,
    pub extractor: ExtractorPolicy,
    pub relevance: RelevancePolicy,
    pub resolution: ResolutionPolicy,
    pub redundancy: RedundancyPolicy,
    pub validation: ValidationPolicy,
    pub reconcile: ReconcilePolicy,
    pub cache: CachePolicy,
}

impl ExtractConfig {
    /// Parse a TOML document; absent keys fall back to defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}
