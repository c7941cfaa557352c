//! # planfact-core
//!
//! Foundation crate for the planfact extraction pipeline.
//! Defines all shared types, collaborator traits, errors, config, and events.
//! Every other crate in the workspace depends on this.

pub mod cancel;
pub mod config;
pub mod errors;
pub mod events;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use cancel::Cancellation;
pub use config::ExtractConfig;
pub use errors::{IngestError, RemoteError, StorageError};
pub use events::{ExtractEventHandler, NullEventHandler, StageEvent};
pub use traits::{LlmExtractor, OcrProvider, PropertyRecords, ResultStore};
pub use types::gate::{GateField, GateStatus, ValidationGate};
pub use types::page::PageText;
pub use types::result::{CacheStatus, ExtractionResult, ResolvedFacts, RunStatus};
pub use types::signal::{Evidence, Signal, SourceType, UnitCountMention};
pub use types::table::{ClassifiedTable, TableType};
pub use types::unit::{BedroomType, UnitMix, UnitRecord};
