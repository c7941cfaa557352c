//! Cloud OCR/layout client.
//!
//! Request: base64 document bytes plus target page numbers. Response:
//! per-page text/lines and table geometry. A missing configuration is the
//! distinguished "no provider" condition the pipeline skips over.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use planfact_core::errors::RemoteError;
use planfact_core::traits::{OcrOutcome, OcrPageResult, OcrProvider, OcrTable};

/// Environment variables configuring the OCR collaborator.
pub const OCR_URL_VAR: &str = "PLANFACT_OCR_URL";
pub const OCR_KEY_VAR: &str = "PLANFACT_OCR_KEY";

pub struct HttpOcrProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    document: String,
    pages: &'a [usize],
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    pages: Vec<PageBlock>,
    #[serde(default)]
    tables: Vec<TableBlock>,
}

#[derive(Deserialize)]
struct PageBlock {
    page: usize,
    text: String,
    #[serde(default)]
    lines: Vec<String>,
}

#[derive(Deserialize)]
struct TableBlock {
    page: usize,
    #[serde(default)]
    header_rows: Vec<Vec<String>>,
    #[serde(default)]
    body_rows: Vec<Vec<String>>,
}

impl HttpOcrProvider {
    /// `base_url` like `https://ocr.example.com` (no trailing slash).
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build from the environment; `None` when no provider is configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(OCR_URL_VAR).ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self::new(base_url, std::env::var(OCR_KEY_VAR).ok()))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl OcrProvider for HttpOcrProvider {
    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "OCR availability probe failed");
                false
            }
        }
    }

    async fn recognize(&self, document: &[u8], pages: &[usize]) -> Result<OcrOutcome, RemoteError> {
        if self.base_url.is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        let url = format!("{}/v1/recognize", self.base_url);
        let request = RecognizeRequest {
            document: BASE64.encode(document),
            pages,
        };

        info!(url = %url, pages = pages.len(), "requesting OCR");
        let resp = self
            .authorized(self.client.post(&url).json(&request))
            .send()
            .await
            .map_err(crate::request_error)?;
        if !resp.status().is_success() {
            return Err(crate::server_error(resp).await);
        }

        let parsed: RecognizeResponse = resp.json().await.map_err(|e| RemoteError::Schema {
            message: e.to_string(),
        })?;
        info!(
            pages = parsed.pages.len(),
            tables = parsed.tables.len(),
            "OCR response received"
        );
        Ok(OcrOutcome {
            pages: parsed
                .pages
                .into_iter()
                .map(|p| OcrPageResult {
                    page: p.page,
                    text: p.text,
                    lines: p.lines,
                })
                .collect(),
            tables: parsed
                .tables
                .into_iter()
                .map(|t| OcrTable {
                    page: t.page,
                    header_rows: t.header_rows,
                    body_rows: t.body_rows,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognize_request_serializes_base64_document() {
        let request = RecognizeRequest {
            document: BASE64.encode(b"pdf bytes"),
            pages: &[0, 3],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["pages"], serde_json::json!([0, 3]));
        let decoded = BASE64
            .decode(json["document"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, b"pdf bytes");
    }

    #[test]
    fn response_tolerates_missing_optional_blocks() {
        let parsed: RecognizeResponse =
            serde_json::from_str(r#"{"pages":[{"page":1,"text":"T-001"}]}"#).unwrap();
        assert_eq!(parsed.pages.len(), 1);
        assert!(parsed.pages[0].lines.is_empty());
        assert!(parsed.tables.is_empty());
    }
}
