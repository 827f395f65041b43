//! Repository for payroll_events
//!
//! Consolidation upserts on (company_id, period, source_fingerprint) so that
//! re-running a period refreshes existing rows instead of accumulating
//! duplicates. Status transitions are guarded in SQL: approve/reject only
//! touch `pending` rows and processing only touches `approved` rows, which
//! keeps terminal states immutable without application-level locking.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{EventSource, EventStatus, EventType, NewPayrollEvent, PayrollEvent};

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    company_id: Uuid,
    employee_id: Uuid,
    period: String,
    event_type: String,
    event_source: String,
    event_data: serde_json::Value,
    calculated_value: f64,
    base_value: f64,
    multiplier: f64,
    status: String,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    processed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Result<PayrollEvent, sqlx::Error> {
        let event_type = EventType::from_str(&self.event_type)
            .ok_or_else(|| decode_error("event_type", &self.event_type))?;
        let event_source = EventSource::from_str(&self.event_source)
            .ok_or_else(|| decode_error("event_source", &self.event_source))?;
        let status = EventStatus::from_str(&self.status)
            .ok_or_else(|| decode_error("status", &self.status))?;

        Ok(PayrollEvent {
            id: self.id,
            company_id: self.company_id,
            employee_id: self.employee_id,
            period: self.period,
            event_type,
            event_source,
            event_data: self.event_data,
            calculated_value: self.calculated_value,
            base_value: self.base_value,
            multiplier: self.multiplier,
            status,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            processed_at: self.processed_at,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn decode_error(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("payroll_events.{column}: unknown value '{value}'").into())
}

const EVENT_COLUMNS: &str = "id, company_id, employee_id, period, event_type, event_source, \
     event_data, calculated_value, base_value, multiplier, status, approved_by, approved_at, \
     processed_at, notes, created_at, updated_at";

/// Upsert one consolidated event. On fingerprint conflict the audit payload
/// and computed values are refreshed; the approval state machine is left
/// untouched.
pub async fn upsert(
    tx: &mut Transaction<'_, Postgres>,
    event: &NewPayrollEvent,
) -> Result<PayrollEvent, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO payroll_events
            (id, company_id, employee_id, period, event_type, event_source, event_data,
             calculated_value, base_value, multiplier, status, source_fingerprint)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', $11)
        ON CONFLICT (company_id, period, source_fingerprint)
        DO UPDATE SET
            event_data = EXCLUDED.event_data,
            calculated_value = EXCLUDED.calculated_value,
            base_value = EXCLUDED.base_value,
            multiplier = EXCLUDED.multiplier,
            updated_at = NOW()
        RETURNING {EVENT_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, EventRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(event.company_id)
        .bind(event.employee_id)
        .bind(&event.period)
        .bind(event.event_type.as_str())
        .bind(event.event_source.as_str())
        .bind(&event.event_data)
        .bind(event.calculated_value)
        .bind(event.base_value)
        .bind(event.multiplier)
        .bind(&event.source_fingerprint)
        .fetch_one(&mut **tx)
        .await?;

    row.into_event()
}

/// Filtered event query. All filters are optional and AND-combined;
/// results come back newest-created-first.
pub async fn find_filtered(
    pool: &PgPool,
    company_id: Uuid,
    period: &str,
    employee_id: Option<Uuid>,
    event_type: Option<EventType>,
    status: Option<EventStatus>,
) -> Result<Vec<PayrollEvent>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {EVENT_COLUMNS}
        FROM payroll_events
        WHERE company_id = $1
          AND period = $2
          AND ($3::uuid IS NULL OR employee_id = $3)
          AND ($4::text IS NULL OR event_type = $4)
          AND ($5::text IS NULL OR status = $5)
        ORDER BY created_at DESC
        "#
    );

    let rows = sqlx::query_as::<_, EventRow>(&sql)
        .bind(company_id)
        .bind(period)
        .bind(employee_id)
        .bind(event_type.map(|t| t.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(EventRow::into_event).collect()
}

/// All approved events for one employee in a period (calculation input)
pub async fn find_approved(
    pool: &PgPool,
    company_id: Uuid,
    employee_id: Uuid,
    period: &str,
) -> Result<Vec<PayrollEvent>, sqlx::Error> {
    find_filtered(
        pool,
        company_id,
        period,
        Some(employee_id),
        None,
        Some(EventStatus::Approved),
    )
    .await
}

/// Bulk approve: pending -> approved, stamping approver and timestamp.
/// Returns the number of rows actually transitioned.
pub async fn approve(
    pool: &PgPool,
    company_id: Uuid,
    event_ids: &[Uuid],
    approved_by: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE payroll_events
        SET status = 'approved',
            approved_by = $1,
            approved_at = NOW(),
            updated_at = NOW()
        WHERE company_id = $2
          AND id = ANY($3)
          AND status = 'pending'
        "#,
    )
    .bind(approved_by)
    .bind(company_id)
    .bind(event_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Bulk reject: pending -> rejected, stamping the actor, timestamp, and the
/// rejection reason into notes.
pub async fn reject(
    pool: &PgPool,
    company_id: Uuid,
    event_ids: &[Uuid],
    rejected_by: &str,
    reason: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE payroll_events
        SET status = 'rejected',
            approved_by = $1,
            approved_at = NOW(),
            notes = $2,
            updated_at = NOW()
        WHERE company_id = $3
          AND id = ANY($4)
          AND status = 'pending'
        "#,
    )
    .bind(rejected_by)
    .bind(reason)
    .bind(company_id)
    .bind(event_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Mark approved events as consumed by a finalized calculation
pub async fn mark_processed(
    tx: &mut Transaction<'_, Postgres>,
    event_ids: &[Uuid],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE payroll_events
        SET status = 'processed',
            processed_at = NOW(),
            updated_at = NOW()
        WHERE id = ANY($1)
          AND status = 'approved'
        "#,
    )
    .bind(event_ids)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
