//! Event Consolidation Service
//!
//! Gathers raw HR facts for a period (time records, benefits, absences,
//! allowances) and emits the canonical payroll-event stream, then manages the
//! pending -> approved/rejected state machine over it.
//!
//! Each pass runs in its own transaction; a single raw record that fails to
//! convert or persist is logged and skipped so one bad row never aborts the
//! period. Events are upserted on a natural-key fingerprint, which makes
//! re-running a period idempotent-by-replacement.

use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    BenefitTipo, EmployeeAbsence, EmployeeAllowance, EmployeeBenefit, EventStatus, EventType,
    EventSource, NewPayrollEvent, PayrollEvent, TimeRecord,
};
use crate::period::{Period, PeriodError};
use crate::repos::{event_repo, source_repo};
use crate::services::worked_hours::{
    compute_worked_hours, split_hours, OVERTIME_MULTIPLIER, STANDARD_DAILY_HOURS,
};
use crate::validation::validate_consolidated_events;

/// Errors that abort a consolidation run outright (infrastructure, not data)
#[derive(Debug, Error)]
pub enum ConsolidationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    InvalidPeriod(#[from] PeriodError),
}

/// Outcome of one consolidation run over a period
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationResult {
    pub period: String,
    pub total_events: usize,
    pub processed_events: usize,
    pub error_events: usize,
    pub events: Vec<PayrollEvent>,
    pub errors: Vec<String>,
}

/// Natural-key fingerprint for a consolidated event. One raw record maps to
/// at most one row per event type, so replaying consolidation updates in
/// place instead of inserting duplicates.
pub fn source_fingerprint(
    employee_id: Uuid,
    period: &str,
    event_type: EventType,
    source_id: Uuid,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(employee_id.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(period.as_bytes());
    hasher.update(b"|");
    hasher.update(event_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(source_id.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_weekend(date: chrono::NaiveDate) -> bool {
    use chrono::Datelike;
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

/// Build payroll events from one attendance record: a worked-hours event
/// plus a separate overtime event for the portion above the standard day.
/// Zero worked hours yields no events.
pub fn time_record_events(
    company_id: Uuid,
    period: &str,
    record: &TimeRecord,
) -> Vec<NewPayrollEvent> {
    let worked = compute_worked_hours(
        record.hora_entrada,
        record.hora_saida,
        record.intervalo_inicio,
        record.intervalo_fim,
    );
    let split = split_hours(worked);

    let mut events = Vec::new();

    if worked > 0.0 {
        events.push(NewPayrollEvent {
            company_id,
            employee_id: record.employee_id,
            period: period.to_string(),
            event_type: EventType::TimeRecord,
            event_source: EventSource::TimeRecords,
            event_data: serde_json::json!({
                "date": record.data,
                "check_in": record.hora_entrada,
                "check_out": record.hora_saida,
                "break_start": record.intervalo_inicio,
                "break_end": record.intervalo_fim,
                "worked_hours": worked,
                "is_holiday": record.tipo.as_deref() == Some("feriado"),
                "is_weekend": is_weekend(record.data),
                "notes": record.justificativa,
            }),
            calculated_value: worked,
            base_value: STANDARD_DAILY_HOURS,
            multiplier: 1.0,
            source_fingerprint: source_fingerprint(
                record.employee_id,
                period,
                EventType::TimeRecord,
                record.id,
            ),
        });
    }

    if split.overtime > 0.0 {
        events.push(NewPayrollEvent {
            company_id,
            employee_id: record.employee_id,
            period: period.to_string(),
            event_type: EventType::Overtime,
            event_source: EventSource::TimeRecords,
            event_data: serde_json::json!({
                "date": record.data,
                "overtime_hours": split.overtime,
                "regular_hours": split.regular,
                "total_hours": worked,
                "overtime_rate": OVERTIME_MULTIPLIER,
            }),
            calculated_value: split.overtime,
            base_value: split.overtime,
            multiplier: OVERTIME_MULTIPLIER,
            source_fingerprint: source_fingerprint(
                record.employee_id,
                period,
                EventType::Overtime,
                record.id,
            ),
        });
    }

    events
}

/// Build one benefit event from an active assignment. Fixed-value benefits
/// use the configured amount; percentage benefits apply against the
/// assignment's base salary.
pub fn benefit_event(company_id: Uuid, period: &str, benefit: &EmployeeBenefit) -> NewPayrollEvent {
    let calculated_value = match benefit.benefit_tipo {
        BenefitTipo::ValorFixo => benefit.valor.unwrap_or(0.0),
        BenefitTipo::Percentual => {
            benefit.salario_base.unwrap_or(0.0) * benefit.percentual.unwrap_or(0.0) / 100.0
        }
    };

    NewPayrollEvent {
        company_id,
        employee_id: benefit.employee_id,
        period: period.to_string(),
        event_type: EventType::Benefit,
        event_source: EventSource::Benefits,
        event_data: serde_json::json!({
            "benefit_id": benefit.id,
            "benefit_name": benefit.benefit_nome,
            "benefit_type": benefit.benefit_tipo.as_str(),
            "base_salary": benefit.salario_base,
            "start_date": benefit.data_inicio,
            "end_date": benefit.data_fim,
        }),
        calculated_value,
        base_value: benefit.salario_base.unwrap_or(0.0),
        multiplier: benefit.percentual.map(|p| p / 100.0).unwrap_or(1.0),
        source_fingerprint: source_fingerprint(
            benefit.employee_id,
            period,
            EventType::Benefit,
            benefit.id,
        ),
    }
}

/// Build one absence event. The day count is inclusive of both endpoints and
/// the value is negative: absences always deduct.
pub fn absence_event(company_id: Uuid, period: &str, absence: &EmployeeAbsence) -> NewPayrollEvent {
    let absence_days = (absence.data_fim - absence.data_inicio).num_days() as f64 + 1.0;

    NewPayrollEvent {
        company_id,
        employee_id: absence.employee_id,
        period: period.to_string(),
        event_type: EventType::Absence,
        event_source: EventSource::Absences,
        event_data: serde_json::json!({
            "absence_type": absence.absence_type,
            "start_date": absence.data_inicio,
            "end_date": absence.data_fim,
            "absence_days": absence_days,
            "reason": absence.motivo,
            "medical_certificate": absence.atestado_medico,
        }),
        calculated_value: -absence_days,
        base_value: absence_days,
        multiplier: -1.0,
        source_fingerprint: source_fingerprint(
            absence.employee_id,
            period,
            EventType::Absence,
            absence.id,
        ),
    }
}

/// Build one allowance event from an active assignment
pub fn allowance_event(
    company_id: Uuid,
    period: &str,
    allowance: &EmployeeAllowance,
) -> NewPayrollEvent {
    NewPayrollEvent {
        company_id,
        employee_id: allowance.employee_id,
        period: period.to_string(),
        event_type: EventType::Allowance,
        event_source: EventSource::Manual,
        event_data: serde_json::json!({
            "allowance_type": allowance.allowance_type,
            "value": allowance.valor,
            "percentage": allowance.percentual,
            "start_date": allowance.data_inicio,
            "end_date": allowance.data_fim,
            "notes": allowance.observacoes,
        }),
        calculated_value: allowance.valor.unwrap_or(0.0),
        base_value: allowance.valor.unwrap_or(0.0),
        multiplier: allowance.percentual.map(|p| p / 100.0).unwrap_or(1.0),
        source_fingerprint: source_fingerprint(
            allowance.employee_id,
            period,
            EventType::Allowance,
            allowance.id,
        ),
    }
}

/// Persist a pass's event drafts in one transaction. Individual upsert
/// failures are collected into log output and skipped; only opening or
/// committing the transaction can abort the pass.
async fn persist_pass(
    pool: &PgPool,
    pass_name: &str,
    drafts: Vec<NewPayrollEvent>,
) -> Result<Vec<PayrollEvent>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut saved = Vec::with_capacity(drafts.len());

    for draft in drafts {
        match event_repo::upsert(&mut tx, &draft).await {
            Ok(event) => saved.push(event),
            Err(e) => {
                tracing::warn!(
                    pass = pass_name,
                    employee_id = %draft.employee_id,
                    error = %e,
                    "skipping event that failed to persist"
                );
            }
        }
    }

    tx.commit().await?;

    tracing::info!(pass = pass_name, events = saved.len(), "consolidation pass complete");
    Ok(saved)
}

/// Consolidate all payroll events for a period.
///
/// Runs the four passes in fixed order (time records, benefits, absences,
/// allowances), persists every computed event with status `pending`, then
/// validates the emitted set. Validation problems are returned in `errors`,
/// never raised.
pub async fn consolidate_payroll_events(
    pool: &PgPool,
    company_id: Uuid,
    period: &str,
    employee_ids: Option<&[Uuid]>,
) -> Result<ConsolidationResult, ConsolidationError> {
    let parsed = Period::parse(period)?;
    let start = parsed.first_day();
    let end = parsed.last_day();

    tracing::info!(company_id = %company_id, period, "starting payroll event consolidation");

    let mut events: Vec<PayrollEvent> = Vec::new();

    // 1. Time records (worked hours + overtime)
    let records =
        source_repo::time_records_for_period(pool, company_id, start, end, employee_ids).await?;
    let drafts = records
        .iter()
        .flat_map(|r| time_record_events(company_id, period, r))
        .collect();
    events.extend(persist_pass(pool, "time_records", drafts).await?);

    // 2. Benefits
    let benefits =
        source_repo::active_benefits_for_period(pool, company_id, start, end, employee_ids).await?;
    let drafts = benefits
        .iter()
        .map(|b| benefit_event(company_id, period, b))
        .collect();
    events.extend(persist_pass(pool, "benefits", drafts).await?);

    // 3. Absences
    let absences =
        source_repo::absences_for_period(pool, company_id, start, end, employee_ids).await?;
    let drafts = absences
        .iter()
        .map(|a| absence_event(company_id, period, a))
        .collect();
    events.extend(persist_pass(pool, "absences", drafts).await?);

    // 4. Allowances
    let allowances =
        source_repo::active_allowances_for_period(pool, company_id, start, end, employee_ids)
            .await?;
    let drafts = allowances
        .iter()
        .map(|a| allowance_event(company_id, period, a))
        .collect();
    events.extend(persist_pass(pool, "allowances", drafts).await?);

    // 5. Validate the full emitted set
    let errors = validate_consolidated_events(&events);

    let result = ConsolidationResult {
        period: period.to_string(),
        total_events: events.len(),
        processed_events: events.len(),
        error_events: errors.len(),
        events,
        errors,
    };

    tracing::info!(
        period,
        processed = result.processed_events,
        validation_errors = result.error_events,
        "payroll event consolidation complete"
    );

    Ok(result)
}

/// Query consolidated events with optional AND-combined filters
pub async fn get_consolidated_events(
    pool: &PgPool,
    company_id: Uuid,
    period: &str,
    employee_id: Option<Uuid>,
    event_type: Option<EventType>,
    status: Option<EventStatus>,
) -> Result<Vec<PayrollEvent>, sqlx::Error> {
    event_repo::find_filtered(pool, company_id, period, employee_id, event_type, status).await
}

/// Bulk-approve pending events. Persistence failures are logged and reported
/// as `false`, never raised.
pub async fn approve_events(
    pool: &PgPool,
    company_id: Uuid,
    event_ids: &[Uuid],
    approved_by: &str,
) -> bool {
    match event_repo::approve(pool, company_id, event_ids, approved_by).await {
        Ok(updated) => {
            tracing::info!(company_id = %company_id, updated, "events approved");
            true
        }
        Err(e) => {
            tracing::error!(company_id = %company_id, error = %e, "failed to approve events");
            false
        }
    }
}

/// Bulk-reject pending events, recording the reason in notes
pub async fn reject_events(
    pool: &PgPool,
    company_id: Uuid,
    event_ids: &[Uuid],
    rejected_by: &str,
    reason: &str,
) -> bool {
    match event_repo::reject(pool, company_id, event_ids, rejected_by, reason).await {
        Ok(updated) => {
            tracing::info!(company_id = %company_id, updated, "events rejected");
            true
        }
        Err(e) => {
            tracing::error!(company_id = %company_id, error = %e, "failed to reject events");
            false
        }
    }
}
