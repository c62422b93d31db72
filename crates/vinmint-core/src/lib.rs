//! Core types and traits for VIN issuance.
//!
//! This crate holds everything that does not perform I/O: the check-digit
//! codec, the model-year table, VIN assembly and validation, and the
//! [`SequenceStore`] trait implemented by the storage backends.

pub mod checksum;
pub mod error;
pub mod model_year;
pub mod sequence;
pub mod validate;
pub mod vin;

pub use checksum::compute_check;
pub use error::{SequenceError, VinError};
pub use sequence::{BackendKind, SequenceStats, SequenceStore};
pub use validate::{validate_code, ValidationReport};
pub use vin::{assemble, Prefix, Vin, VinFields, MAX_SEQUENCE};
