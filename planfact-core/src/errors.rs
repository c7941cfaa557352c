//! Layer errors. None of these cross the orchestrator boundary: the
//! pipeline's public contract is "always returns a result object", with
//! failure expressed through warnings and gates.

/// Errors from document ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("document could not be parsed: {message}")]
    UnreadableDocument { message: String },

    #[error("document has no pages")]
    NoPages,
}

/// Errors from network collaborators (OCR, LLM, property records).
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The distinguished "no provider configured" condition, a non-fatal
    /// skip, not a failure.
    #[error("no provider configured")]
    NotConfigured,

    #[error("request failed: {message}")]
    Request { message: String },

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("response did not match the expected schema: {message}")]
    Schema { message: String },
}

impl RemoteError {
    /// Whether this error means the collaborator simply is not set up,
    /// as opposed to a transport or contract failure.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured)
    }
}

/// Errors from the result cache. Always treated as a cache miss by callers.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("stored result could not be decoded: {message}")]
    Decode { message: String },

    #[error("schema version mismatch: found {found}, expected {expected}")]
    SchemaVersion { found: u32, expected: u32 },
}
