//! Repository for eSocial staging tables (batches and processed events)

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::esocial::{ESocialBatch, ESocialBatchStatus, ESocialEvent, ESocialEventStatus};

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: Uuid,
    company_id: Uuid,
    batch_number: String,
    period: String,
    total_events: i32,
    sent_events: i32,
    accepted_events: i32,
    rejected_events: i32,
    error_events: i32,
    status: String,
    sent_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BatchRow {
    fn into_batch(self) -> Result<ESocialBatch, sqlx::Error> {
        let status = ESocialBatchStatus::from_str(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("esocial_batches.status: unknown value '{}'", self.status).into())
        })?;

        Ok(ESocialBatch {
            id: self.id,
            company_id: self.company_id,
            batch_number: self.batch_number,
            period: self.period,
            total_events: self.total_events,
            sent_events: self.sent_events,
            accepted_events: self.accepted_events,
            rejected_events: self.rejected_events,
            error_events: self.error_events,
            status,
            sent_at: self.sent_at,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    company_id: Uuid,
    employee_id: Uuid,
    batch_id: Uuid,
    event_type: String,
    period: String,
    event_data: serde_json::Value,
    status: String,
    sent_at: Option<DateTime<Utc>>,
    response_data: Option<serde_json::Value>,
    error_message: Option<String>,
    retry_count: i32,
    max_retries: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Result<ESocialEvent, sqlx::Error> {
        let status = ESocialEventStatus::from_str(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(
                format!("esocial_processed_events.status: unknown value '{}'", self.status).into(),
            )
        })?;

        Ok(ESocialEvent {
            id: self.id,
            company_id: self.company_id,
            employee_id: self.employee_id,
            batch_id: self.batch_id,
            event_type: self.event_type,
            period: self.period,
            event_data: self.event_data,
            status,
            sent_at: self.sent_at,
            response_data: self.response_data,
            error_message: self.error_message,
            retry_count: self.retry_count,
            max_retries: self.max_retries,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BATCH_COLUMNS: &str = "id, company_id, batch_number, period, total_events, sent_events, \
     accepted_events, rejected_events, error_events, status, sent_at, error_message, \
     created_at, updated_at";

const EVENT_COLUMNS: &str = "id, company_id, employee_id, batch_id, event_type, period, \
     event_data, status, sent_at, response_data, error_message, retry_count, max_retries, \
     created_at, updated_at";

/// Create a new pending batch for a period
pub async fn insert_batch(
    pool: &PgPool,
    company_id: Uuid,
    batch_number: &str,
    period: &str,
) -> Result<ESocialBatch, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO esocial_batches (id, company_id, batch_number, period)
        VALUES ($1, $2, $3, $4)
        RETURNING {BATCH_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, BatchRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(batch_number)
        .bind(period)
        .fetch_one(pool)
        .await?;

    row.into_batch()
}

/// Stage one government-format event against a batch
pub async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    employee_id: Uuid,
    batch_id: Uuid,
    event_type: &str,
    period: &str,
    event_data: &serde_json::Value,
    max_retries: i32,
) -> Result<ESocialEvent, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO esocial_processed_events
            (id, company_id, employee_id, batch_id, event_type, period, event_data, max_retries)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {EVENT_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, EventRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(employee_id)
        .bind(batch_id)
        .bind(event_type)
        .bind(period)
        .bind(event_data)
        .bind(max_retries)
        .fetch_one(&mut **tx)
        .await?;

    row.into_event()
}

/// Refresh a batch's aggregate counters after staging
pub async fn update_batch_totals(
    pool: &PgPool,
    batch_id: Uuid,
    total_events: i32,
    error_events: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE esocial_batches
        SET total_events = $1,
            error_events = $2,
            updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(total_events)
    .bind(error_events)
    .bind(batch_id)
    .execute(pool)
    .await?;

    Ok(())
}
