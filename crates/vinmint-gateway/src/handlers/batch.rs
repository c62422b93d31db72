use crate::error::Result;
use crate::model::ValidateRequest;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tokio::time::Instant;
use vinmint_core::{validate_code, ValidationReport};
use vinmint_issuer::{BatchRequest, BatchResult};

pub async fn create_batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchResult>)> {
    let deadline = Instant::now() + state.allocation_timeout();
    let batch = state
        .allocator()
        .generate_batch_until(&request, deadline)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn validate_code_handler(Json(request): Json<ValidateRequest>) -> Json<ValidationReport> {
    Json(validate_code(&request.code))
}
