//! Page-relevance policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevancePolicy {
    /// A page qualifies as relevant at this weighted keyword score.
    pub relevance_threshold: u32,
    /// Bounded page budget for the language-model pass.
    pub max_llm_pages: usize,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            relevance_threshold: 3,
            max_llm_pages: 8,
        }
    }
}
