//! Authoritative property-record lookup client.

use async_trait::async_trait;
use tracing::info;

use planfact_core::errors::RemoteError;
use planfact_core::traits::{PropertyRecord, PropertyRecords};

/// Environment variable configuring the property-record collaborator.
pub const PROPERTY_URL_VAR: &str = "PLANFACT_PROPERTY_URL";

pub struct HttpPropertyRecords {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPropertyRecords {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from the environment; `None` when no lookup is configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(PROPERTY_URL_VAR).ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self::new(base_url))
    }
}

#[async_trait]
impl PropertyRecords for HttpPropertyRecords {
    async fn lookup(&self, parcel_id: &str) -> Result<Option<PropertyRecord>, RemoteError> {
        if self.base_url.is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        let url = format!("{}/v1/parcels/{parcel_id}", self.base_url);

        info!(url = %url, "looking up property record");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(crate::request_error)?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(crate::server_error(resp).await);
        }

        let record: PropertyRecord = resp.json().await.map_err(|e| RemoteError::Schema {
            message: e.to_string(),
        })?;
        Ok(Some(record))
    }
}
