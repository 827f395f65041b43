use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::routes::AppState;

/// Handler for GET /api/metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics error: {e}"),
        ),
    }
}
