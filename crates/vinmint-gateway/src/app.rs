use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_batch_handler, current_sequence_handler, health_handler, sequence_stats_handler,
    validate_code_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest(
                "/v1",
                Router::new()
                    .route("/batches", post(create_batch_handler))
                    .route("/codes/validate", post(validate_code_handler))
                    .route("/sequences/stats", get(sequence_stats_handler))
                    .route("/sequences/{prefix}", get(current_sequence_handler)),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
