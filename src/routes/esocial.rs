//! Routes for eSocial event staging

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::esocial::service::{self, ESocialError, ESocialIntegrationResult};
use crate::routes::{AppState, HttpError};

fn map_error(error: ESocialError) -> HttpError {
    match error {
        ESocialError::CompanyNotFound(_) => HttpError::not_found(error.to_string()),
        ESocialError::Database(e) => {
            tracing::error!(error = %e, "eSocial staging failed");
            HttpError::internal()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub company_id: Uuid,
    pub period: String,
    pub employee_ids: Option<Vec<Uuid>>,
}

/// Handler for POST /api/payroll/esocial/process
pub async fn process_events(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ESocialIntegrationResult>, HttpError> {
    let result = service::process_esocial_events(
        &state.pool,
        &state.esocial_registry,
        request.company_id,
        &request.period,
        request.employee_ids.as_deref(),
    )
    .await
    .map_err(map_error)?;

    state
        .metrics
        .esocial_events_staged_total
        .with_label_values(&["staged"])
        .inc_by(result.events_processed as u64);
    state
        .metrics
        .esocial_events_staged_total
        .with_label_values(&["error"])
        .inc_by(result.errors.len() as u64);

    Ok(Json(result))
}
