//! eSocial staging service
//!
//! Builds government-format events for a period and stages them, pending,
//! against a new batch. Transmission to the government endpoint is a separate
//! concern and is not performed here; the retry bookkeeping fields are staged
//! with each event for the transmitter to use.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::esocial::builders::{BuilderContext, BuilderRegistry};
use crate::esocial::DEFAULT_MAX_RETRIES;
use crate::repos::{calculation_repo, employee_repo, esocial_repo};

/// Errors that abort eSocial processing outright
#[derive(Debug, Error)]
pub enum ESocialError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Company not found: {0}")]
    CompanyNotFound(Uuid),
}

/// Outcome of staging one period into a batch
#[derive(Debug, Clone, Serialize)]
pub struct ESocialIntegrationResult {
    pub success: bool,
    pub batch_id: Option<Uuid>,
    pub events_processed: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Build and stage eSocial events for every employee in scope.
///
/// A failing employee is recorded in `errors` and skipped; the batch keeps
/// going. The batch's aggregate counters are refreshed at the end.
pub async fn process_esocial_events(
    pool: &PgPool,
    registry: &BuilderRegistry,
    company_id: Uuid,
    period: &str,
    employee_ids: Option<&[Uuid]>,
) -> Result<ESocialIntegrationResult, ESocialError> {
    tracing::info!(company_id = %company_id, period, "staging eSocial events");

    let company = employee_repo::find_company(pool, company_id)
        .await?
        .ok_or(ESocialError::CompanyNotFound(company_id))?;

    let employees = employee_repo::find_active_for_company(pool, company_id, employee_ids).await?;

    let mut result = ESocialIntegrationResult {
        success: true,
        batch_id: None,
        events_processed: 0,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    if employees.is_empty() {
        result.success = false;
        result
            .errors
            .push("Nenhum funcionário encontrado para o período".to_string());
        return Ok(result);
    }

    let batch_number = format!("LOTE-{}-{}", period, &Uuid::new_v4().simple().to_string()[..8]);
    let batch = esocial_repo::insert_batch(pool, company_id, &batch_number, period).await?;
    result.batch_id = Some(batch.id);

    for employee in &employees {
        let calculation =
            match calculation_repo::find_with_items(pool, company_id, employee.id, period).await {
                Ok(calculation) => calculation,
                Err(e) => {
                    result.errors.push(format!(
                        "Erro ao processar funcionário {}: {}",
                        employee.nome, e
                    ));
                    continue;
                }
            };

        if calculation.is_none() {
            result.warnings.push(format!(
                "Funcionário {} sem cálculo de folha no período",
                employee.nome
            ));
        }

        let ctx = BuilderContext {
            company: &company,
            employee,
            period,
            calculation: calculation.as_ref(),
        };

        let built = registry.build_all(&ctx);

        let mut tx = match pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                result.errors.push(format!(
                    "Erro ao processar funcionário {}: {}",
                    employee.nome, e
                ));
                continue;
            }
        };

        let mut staged = 0usize;
        let mut failed = false;

        for (code, payload) in built {
            match esocial_repo::insert_event(
                &mut tx,
                company_id,
                employee.id,
                batch.id,
                code,
                period,
                &payload,
                DEFAULT_MAX_RETRIES,
            )
            .await
            {
                Ok(_) => staged += 1,
                Err(e) => {
                    result.errors.push(format!(
                        "Erro ao processar funcionário {}: {}",
                        employee.nome, e
                    ));
                    failed = true;
                    break;
                }
            }
        }

        if failed {
            let _ = tx.rollback().await;
            continue;
        }

        match tx.commit().await {
            Ok(()) => result.events_processed += staged,
            Err(e) => {
                result.errors.push(format!(
                    "Erro ao processar funcionário {}: {}",
                    employee.nome, e
                ));
            }
        }
    }

    esocial_repo::update_batch_totals(
        pool,
        batch.id,
        result.events_processed as i32,
        result.errors.len() as i32,
    )
    .await?;

    result.success = result.errors.is_empty();

    tracing::info!(
        batch_id = %batch.id,
        events = result.events_processed,
        errors = result.errors.len(),
        "eSocial staging complete"
    );

    Ok(result)
}
