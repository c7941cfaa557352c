//! Language-model extraction client.
//!
//! Sends the bounded set of relevant page texts (plus optional authoritative
//! context) and receives the fixed nullable schema. The per-unit record
//! sanity cap from the service contract is also enforced here after
//! parsing, so a misbehaving deployment cannot flood the reconciler.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use planfact_core::errors::RemoteError;
use planfact_core::traits::{LlmExtraction, LlmExtractor, PropertyRecord};
use planfact_core::types::page::PageText;

/// Environment variables configuring the LLM collaborator.
pub const LLM_URL_VAR: &str = "PLANFACT_LLM_URL";
pub const LLM_KEY_VAR: &str = "PLANFACT_LLM_KEY";

/// Record-cap ratio from the service contract: per-unit records may exceed
/// the declared cover-sheet total by at most 50%.
const RECORD_CAP_RATIO: f64 = 1.5;

pub struct HttpLlmExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    pages: Vec<PagePayload<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<&'a PropertyRecord>,
}

#[derive(Serialize)]
struct PagePayload<'a> {
    page: usize,
    text: &'a str,
}

impl HttpLlmExtractor {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build from the environment; `None` when no extractor is configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(LLM_URL_VAR).ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self::new(base_url, std::env::var(LLM_KEY_VAR).ok()))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl LlmExtractor for HttpLlmExtractor {
    async fn extract(
        &self,
        pages: &[PageText],
        reference: Option<&PropertyRecord>,
    ) -> Result<LlmExtraction, RemoteError> {
        if self.base_url.is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        let url = format!("{}/v1/extract", self.base_url);
        let request = ExtractRequest {
            pages: pages
                .iter()
                .map(|p| PagePayload {
                    page: p.page_index,
                    text: &p.text,
                })
                .collect(),
            reference,
        };

        info!(url = %url, pages = pages.len(), "requesting LLM extraction");
        let resp = self
            .authorized(self.client.post(&url).json(&request))
            .send()
            .await
            .map_err(crate::request_error)?;
        if !resp.status().is_success() {
            return Err(crate::server_error(resp).await);
        }

        let mut extraction: LlmExtraction =
            resp.json().await.map_err(|e| RemoteError::Schema {
                message: e.to_string(),
            })?;
        extraction.apply_record_cap(RECORD_CAP_RATIO);
        debug!(
            total_units = ?extraction.total_units,
            unit_records = extraction.units.len(),
            missing = extraction.confidence.missing_fields.len(),
            "LLM extraction received"
        );
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_page_indices_and_reference() {
        let pages = vec![PageText::new(2, "ZONING ANALYSIS".to_string(), false)];
        let reference = PropertyRecord {
            lot_area_sf: 10_000.0,
            resid_far: 3.0,
            bldg_area_sf: None,
        };
        let request = ExtractRequest {
            pages: pages
                .iter()
                .map(|p| PagePayload {
                    page: p.page_index,
                    text: &p.text,
                })
                .collect(),
            reference: Some(&reference),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["pages"][0]["page"], 2);
        assert_eq!(json["reference"]["lot_area_sf"], 10_000.0);
    }

    #[test]
    fn extraction_schema_accepts_all_nulls() {
        let extraction: LlmExtraction = serde_json::from_str("{}").unwrap();
        assert!(extraction.total_units.is_none());
        assert!(extraction.units.is_empty());
    }
}
