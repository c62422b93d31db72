use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use vinmint_core::{SequenceError, VinError};
use vinmint_issuer::{IssuerError, PartialBatch};

pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    /// Codes issued before the batch stopped. These are valid and must be kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialBatch>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: Box<ErrorBody>,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Box::new(ErrorBody {
                code: code.to_string(),
                message: message.into(),
                retryable: status == StatusCode::SERVICE_UNAVAILABLE,
                partial: None,
            }),
        }
    }

    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unavailable(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    pub fn internal(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    fn with_partial(mut self, partial: PartialBatch) -> Self {
        self.body.partial = Some(partial);
        self
    }
}

impl From<VinError> for AppError {
    fn from(value: VinError) -> Self {
        match value {
            VinError::InvariantViolation(message) => {
                AppError::internal("invariant_violation", message)
            }
            other => AppError::bad_request("invalid_request", other.to_string()),
        }
    }
}

impl From<SequenceError> for AppError {
    fn from(value: SequenceError) -> Self {
        let message = value.to_string();
        match value {
            SequenceError::Unavailable(_) => AppError::unavailable("store_unavailable", message),
            SequenceError::Timeout(_) => AppError::unavailable("store_timeout", message),
            SequenceError::Persist(_) | SequenceError::Operation(_) => {
                AppError::unavailable("store_failure", message)
            }
            SequenceError::InvalidData(_) => AppError::internal("store_corrupt", message),
        }
    }
}

impl From<IssuerError> for AppError {
    fn from(value: IssuerError) -> Self {
        let message = value.to_string();
        match value {
            IssuerError::Validation(err) => AppError::from(err),
            IssuerError::InvalidQuantity(_) => AppError::bad_request("invalid_request", message),
            IssuerError::Store(err) => AppError::from(err),
            IssuerError::SequenceExhausted { .. } => {
                AppError::unavailable("sequence_exhausted", message)
            }
            IssuerError::InvariantViolation(_) => AppError::internal("invariant_violation", message),
            IssuerError::PartialBatch { partial, cause } => {
                let status = match AppError::from(*cause).status {
                    StatusCode::INTERNAL_SERVER_ERROR => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::SERVICE_UNAVAILABLE,
                };
                AppError::new(status, "partial_batch", message).with_partial(*partial)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, code = %self.body.code, message = %self.body.message, "request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vinmint_core::{Prefix, Vin};

    #[test]
    fn validation_maps_to_bad_request() {
        let err = AppError::from(IssuerError::from(VinError::UnsupportedYear(2031)));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(!err.body.retryable);
    }

    #[test]
    fn unavailable_store_is_retryable() {
        let err = AppError::from(SequenceError::Unavailable("refused".to_string()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.body.retryable);
    }

    #[test]
    fn partial_batch_keeps_issued_codes() {
        let partial = PartialBatch {
            prefix: Prefix::new("LZSHCKZSWS").unwrap(),
            requested: 3,
            codes: vec![Vin::parse("LZSHCKZS3WS000001").unwrap()],
        };
        let err = AppError::from(IssuerError::PartialBatch {
            partial: Box::new(partial),
            cause: Box::new(IssuerError::Store(SequenceError::Timeout(
                "deadline".to_string(),
            ))),
        });

        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.body.code, "partial_batch");
        assert_eq!(err.body.partial.as_ref().map(|p| p.codes.len()), Some(1));
    }

    #[test]
    fn partial_invariant_violation_is_internal() {
        let partial = PartialBatch {
            prefix: Prefix::new("LZSHCKZSWS").unwrap(),
            requested: 3,
            codes: Vec::new(),
        };
        let err = AppError::from(IssuerError::PartialBatch {
            partial: Box::new(partial),
            cause: Box::new(IssuerError::InvariantViolation("bad check".to_string())),
        });

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
