//! Table reconstruction (native positional text + OCR geometry) and
//! semantic classification.

pub mod classify;
pub mod reconstruct;

pub use classify::TableClassifier;
pub use reconstruct::{from_ocr_tables, reconstruct_native, RawTable};
