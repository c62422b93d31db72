use crate::error::Result;
use crate::model::CurrentSequenceResponse;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use vinmint_core::{Prefix, SequenceStats};

pub async fn current_sequence_handler(
    Path(prefix): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CurrentSequenceResponse>> {
    let prefix = Prefix::new(prefix)?;
    let current = state.bounded(state.store().read_current(&prefix)).await?;
    Ok(Json(CurrentSequenceResponse {
        prefix,
        current,
        backend: state.store().backend().to_string(),
    }))
}

pub async fn sequence_stats_handler(State(state): State<AppState>) -> Result<Json<SequenceStats>> {
    Ok(Json(state.bounded(state.store().statistics()).await?))
}
