//! Routes for payroll event consolidation and the approval state machine

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{EventStatus, EventType, PayrollEvent};
use crate::routes::{AppState, HttpError};
use crate::services::consolidation_service::{self, ConsolidationError, ConsolidationResult};

fn map_error(error: ConsolidationError) -> HttpError {
    match error {
        ConsolidationError::InvalidPeriod(_) => HttpError::bad_request(error.to_string()),
        ConsolidationError::Database(e) => {
            tracing::error!(error = %e, "consolidation failed");
            HttpError::internal()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConsolidateRequest {
    pub company_id: Uuid,
    pub period: String,
    pub employee_ids: Option<Vec<Uuid>>,
}

/// Handler for POST /api/payroll/events/consolidate
pub async fn consolidate_events(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConsolidateRequest>,
) -> Result<Json<ConsolidationResult>, HttpError> {
    let result = consolidation_service::consolidate_payroll_events(
        &state.pool,
        request.company_id,
        &request.period,
        request.employee_ids.as_deref(),
    )
    .await
    .map_err(map_error)?;

    for event in &result.events {
        state
            .metrics
            .payroll_events_consolidated_total
            .with_label_values(&[event.event_type.as_str()])
            .inc();
    }

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub company_id: Uuid,
    pub period: String,
    pub employee_id: Option<Uuid>,
    pub event_type: Option<String>,
    pub status: Option<String>,
}

/// Handler for GET /api/payroll/events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<PayrollEvent>>, HttpError> {
    let event_type = match query.event_type.as_deref() {
        Some(s) => Some(
            EventType::from_str(s)
                .ok_or_else(|| HttpError::bad_request(format!("Unknown event_type: {s}")))?,
        ),
        None => None,
    };

    let status = match query.status.as_deref() {
        Some(s) => Some(
            EventStatus::from_str(s)
                .ok_or_else(|| HttpError::bad_request(format!("Unknown status: {s}")))?,
        ),
        None => None,
    };

    let events = consolidation_service::get_consolidated_events(
        &state.pool,
        query.company_id,
        &query.period,
        query.employee_id,
        event_type,
        status,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "event query failed");
        HttpError::internal()
    })?;

    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub company_id: Uuid,
    pub event_ids: Vec<Uuid>,
    pub approved_by: String,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub success: bool,
}

/// Handler for POST /api/payroll/events/approve
pub async fn approve_events(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApproveRequest>,
) -> Json<TransitionResponse> {
    let success = consolidation_service::approve_events(
        &state.pool,
        request.company_id,
        &request.event_ids,
        &request.approved_by,
    )
    .await;

    Json(TransitionResponse { success })
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub company_id: Uuid,
    pub event_ids: Vec<Uuid>,
    pub rejected_by: String,
    pub reason: String,
}

/// Handler for POST /api/payroll/events/reject
pub async fn reject_events(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RejectRequest>,
) -> Json<TransitionResponse> {
    let success = consolidation_service::reject_events(
        &state.pool,
        request.company_id,
        &request.event_ids,
        &request.rejected_by,
        &request.reason,
    )
    .await;

    Json(TransitionResponse { success })
}
