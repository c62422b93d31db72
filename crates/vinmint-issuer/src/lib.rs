//! Batch issuance of VINs.
//!
//! [`BatchAllocator`] validates a [`BatchRequest`], draws one sequence
//! number per code from a [`vinmint_core::SequenceStore`] and assembles the
//! final codes. Core types are re-exported from `vinmint_core`.

pub mod batch;
pub mod error;

pub use batch::{BatchAllocator, BatchRequest, BatchResult, PartialBatch, MAX_QUANTITY};
pub use error::IssuerError;
pub use vinmint_core::{Prefix, SequenceStore, Vin};
