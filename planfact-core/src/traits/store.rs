//! Result store contract implemented by the storage crate.

use crate::errors::StorageError;
use crate::types::result::ExtractionResult;

/// Content-hash-keyed persisted store for finished results.
///
/// Both operations are best-effort from the pipeline's point of view: a
/// failed load is a miss, a failed store is logged and ignored.
pub trait ResultStore: Send + Sync {
    /// Look up a non-expired result by content hash.
    fn load(&self, content_hash: &str) -> Result<Option<ExtractionResult>, StorageError>;

    /// Persist a freshly computed result under its content hash.
    fn store(&self, content_hash: &str, result: &ExtractionResult) -> Result<(), StorageError>;
}
