//! Routes for running and reading payroll calculations

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    CalculationStatus, CalculationType, PayrollCalculation, PayrollCalculationItem,
};
use crate::routes::{AppState, HttpError};
use crate::services::calculation_service::{self, CalculationError, CalculationResult};

fn map_error(error: CalculationError) -> HttpError {
    match error {
        CalculationError::InvalidPeriod(_) => HttpError::bad_request(error.to_string()),
        CalculationError::EmployeeNotFound(_) => HttpError::not_found(error.to_string()),
        CalculationError::Database(e) => {
            tracing::error!(error = %e, "payroll calculation failed");
            HttpError::internal()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub period: String,
    pub calculation_type: Option<String>,
}

/// Handler for POST /api/payroll/calculations
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalculateRequest>,
) -> Result<Json<CalculationResult>, HttpError> {
    let calculation_type = match request.calculation_type.as_deref() {
        Some(s) => CalculationType::from_str(s)
            .ok_or_else(|| HttpError::bad_request(format!("Unknown calculation_type: {s}")))?,
        None => CalculationType::Full,
    };

    let result = calculation_service::calculate_payroll(
        &state.pool,
        request.company_id,
        request.employee_id,
        &request.period,
        calculation_type,
    )
    .await
    .map_err(map_error)?;

    let outcome = if result.calculation.status == CalculationStatus::Pending {
        "reverted_pending"
    } else {
        "calculated"
    };
    state
        .metrics
        .payroll_calculations_total
        .with_label_values(&[outcome])
        .inc();

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct CalculationQuery {
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    pub calculation: PayrollCalculation,
    pub items: Vec<PayrollCalculationItem>,
}

/// Handler for GET /api/payroll/calculations
pub async fn get_calculation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalculationQuery>,
) -> Result<Json<CalculationResponse>, HttpError> {
    let found = calculation_service::get_calculation(
        &state.pool,
        query.company_id,
        query.employee_id,
        &query.period,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "calculation query failed");
        HttpError::internal()
    })?;

    match found {
        Some((calculation, items)) => Ok(Json(CalculationResponse { calculation, items })),
        None => Err(HttpError::not_found(format!(
            "No calculation for employee {} in {}",
            query.employee_id, query.period
        ))),
    }
}
