//! # planfact-remote
//!
//! HTTP clients for the pipeline's optional network collaborators: the cloud
//! OCR/layout service, the language-model extraction service, and the
//! authoritative property-record lookup. Every client is optional at
//! runtime; construction from an unset environment yields `None` and the
//! orchestrator branches on presence.

pub mod llm;
pub mod ocr;
pub mod property;

pub use llm::HttpLlmExtractor;
pub use ocr::HttpOcrProvider;
pub use property::HttpPropertyRecords;

use planfact_core::errors::RemoteError;

pub(crate) fn request_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Request {
        message: e.to_string(),
    }
}

pub(crate) async fn server_error(resp: reqwest::Response) -> RemoteError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    RemoteError::Server { status, body }
}
