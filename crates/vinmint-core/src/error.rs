use thiserror::Error;

/// Result type for codec, assembly and validation operations.
pub type Result<T> = std::result::Result<T, VinError>;

/// Errors raised while building or checking a VIN.
///
/// Every variant except [`VinError::InvariantViolation`] is a validation
/// failure that the caller can fix by correcting its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VinError {
    #[error("invalid length for {field}: expected {expected} characters, got {actual}")]
    Length {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("forbidden character '{character}' in {field}; I, O and Q never appear in a VIN")]
    ForbiddenCharacter { field: &'static str, character: char },
    #[error("unsupported model year {0}; supported years are 2001..=2030")]
    UnsupportedYear(i32),
    #[error("sequence {0} out of range; expected 1..=999999")]
    SequenceOutOfRange(u64),
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl VinError {
    /// Returns `true` for errors caused by caller input rather than a codec defect.
    pub fn is_validation(&self) -> bool {
        !matches!(self, VinError::InvariantViolation(_))
    }
}

/// Errors returned by sequence store backends.
#[derive(Debug, Clone, Error)]
pub enum SequenceError {
    #[error("sequence backend unavailable: {0}")]
    Unavailable(String),
    /// The outcome is unknown: a remote increment may have landed even though
    /// no response arrived.
    #[error("sequence operation timed out: {0}")]
    Timeout(String),
    /// The counter was not advanced because the new value could not be flushed.
    #[error("failed to persist sequence counters: {0}")]
    Persist(String),
    #[error("stored sequence data is invalid: {0}")]
    InvalidData(String),
    #[error("sequence operation failed: {0}")]
    Operation(String),
}
