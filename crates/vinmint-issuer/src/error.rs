use crate::batch::PartialBatch;
use thiserror::Error;
use vinmint_core::{SequenceError, VinError};

pub type Result<T> = std::result::Result<T, IssuerError>;

#[derive(Debug, Clone, Error)]
pub enum IssuerError {
    /// Rejected before any sequence number was allocated.
    #[error("invalid batch request: {0}")]
    Validation(VinError),
    #[error("invalid batch request: quantity {0} out of range; expected 1..=10000")]
    InvalidQuantity(u32),
    #[error(transparent)]
    Store(#[from] SequenceError),
    #[error("prefix {prefix} is exhausted: sequence {sequence} exceeds 999999")]
    SequenceExhausted { prefix: String, sequence: u64 },
    /// A batch stopped part way. The codes in `partial` were durably issued
    /// and stay valid.
    #[error(
        "batch interrupted after {} of {} codes: {cause}",
        .partial.codes.len(),
        .partial.requested
    )]
    PartialBatch {
        partial: Box<PartialBatch>,
        cause: Box<IssuerError>,
    },
    /// The codec produced a code that fails its own check. Never retried.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<VinError> for IssuerError {
    fn from(value: VinError) -> Self {
        match value {
            VinError::InvariantViolation(message) => Self::InvariantViolation(message),
            other => Self::Validation(other),
        }
    }
}

impl IssuerError {
    /// Returns `true` if the request was rejected without consuming any
    /// sequence numbers.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidQuantity(_))
    }

    /// Returns the codes issued before a batch was interrupted.
    pub fn partial(&self) -> Option<&PartialBatch> {
        match self {
            Self::PartialBatch { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Returns the underlying failure, looking through a partial batch.
    pub fn root_cause(&self) -> &IssuerError {
        match self {
            Self::PartialBatch { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
