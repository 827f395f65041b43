//! Repository for the raw HR collaborators consumed by consolidation
//!
//! Time records, benefits, absences, and allowances are owned by upstream
//! modules; this repo only reads them, scoped to company + period bounds and
//! an optional employee allow-list.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    BenefitTipo, EmployeeAbsence, EmployeeAllowance, EmployeeBenefit, TimeRecord,
};

/// Attendance records with a date inside the period
pub async fn time_records_for_period(
    pool: &PgPool,
    company_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    employee_ids: Option<&[Uuid]>,
) -> Result<Vec<TimeRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (
        Uuid,
        Uuid,
        NaiveDate,
        Option<NaiveTime>,
        Option<NaiveTime>,
        Option<NaiveTime>,
        Option<NaiveTime>,
        Option<String>,
        Option<String>,
    )>(
        r#"
        SELECT id, employee_id, data, hora_entrada, hora_saida,
               intervalo_inicio, intervalo_fim, tipo, justificativa
        FROM time_records
        WHERE company_id = $1
          AND data >= $2
          AND data <= $3
          AND ($4::uuid[] IS NULL OR employee_id = ANY($4))
        ORDER BY data
        "#,
    )
    .bind(company_id)
    .bind(period_start)
    .bind(period_end)
    .bind(employee_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| TimeRecord {
            id: r.0,
            employee_id: r.1,
            data: r.2,
            hora_entrada: r.3,
            hora_saida: r.4,
            intervalo_inicio: r.5,
            intervalo_fim: r.6,
            tipo: r.7,
            justificativa: r.8,
        })
        .collect())
}

/// Active benefit assignments whose validity window overlaps the period
pub async fn active_benefits_for_period(
    pool: &PgPool,
    company_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    employee_ids: Option<&[Uuid]>,
) -> Result<Vec<EmployeeBenefit>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (
        Uuid,
        Uuid,
        String,
        String,
        Option<f64>,
        Option<f64>,
        Option<f64>,
        NaiveDate,
        Option<NaiveDate>,
    )>(
        r#"
        SELECT id, employee_id, benefit_nome, benefit_tipo, valor, percentual,
               salario_base, data_inicio, data_fim
        FROM employee_benefits
        WHERE company_id = $1
          AND is_active = TRUE
          AND data_inicio <= $3
          AND (data_fim IS NULL OR data_fim >= $2)
          AND ($4::uuid[] IS NULL OR employee_id = ANY($4))
        ORDER BY data_inicio
        "#,
    )
    .bind(company_id)
    .bind(period_start)
    .bind(period_end)
    .bind(employee_ids)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let benefit_tipo = BenefitTipo::from_str(&r.3).ok_or_else(|| {
                sqlx::Error::Decode(
                    format!("employee_benefits.benefit_tipo: unknown value '{}'", r.3).into(),
                )
            })?;
            Ok(EmployeeBenefit {
                id: r.0,
                employee_id: r.1,
                benefit_nome: r.2,
                benefit_tipo,
                valor: r.4,
                percentual: r.5,
                salario_base: r.6,
                data_inicio: r.7,
                data_fim: r.8,
            })
        })
        .collect()
}

/// Absence spans overlapping the period
pub async fn absences_for_period(
    pool: &PgPool,
    company_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    employee_ids: Option<&[Uuid]>,
) -> Result<Vec<EmployeeAbsence>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (
        Uuid,
        Uuid,
        Option<String>,
        NaiveDate,
        NaiveDate,
        Option<String>,
        bool,
    )>(
        r#"
        SELECT id, employee_id, absence_type, data_inicio, data_fim, motivo, atestado_medico
        FROM employee_absences
        WHERE company_id = $1
          AND data_inicio <= $3
          AND data_fim >= $2
          AND ($4::uuid[] IS NULL OR employee_id = ANY($4))
        ORDER BY data_inicio
        "#,
    )
    .bind(company_id)
    .bind(period_start)
    .bind(period_end)
    .bind(employee_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| EmployeeAbsence {
            id: r.0,
            employee_id: r.1,
            absence_type: r.2,
            data_inicio: r.3,
            data_fim: r.4,
            motivo: r.5,
            atestado_medico: r.6,
        })
        .collect())
}

/// Active allowance assignments whose validity window overlaps the period
pub async fn active_allowances_for_period(
    pool: &PgPool,
    company_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    employee_ids: Option<&[Uuid]>,
) -> Result<Vec<EmployeeAllowance>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (
        Uuid,
        Uuid,
        Option<String>,
        Option<f64>,
        Option<f64>,
        NaiveDate,
        Option<NaiveDate>,
        Option<String>,
    )>(
        r#"
        SELECT id, employee_id, allowance_type, valor, percentual,
               data_inicio, data_fim, observacoes
        FROM employee_allowances
        WHERE company_id = $1
          AND is_active = TRUE
          AND data_inicio <= $3
          AND (data_fim IS NULL OR data_fim >= $2)
          AND ($4::uuid[] IS NULL OR employee_id = ANY($4))
        ORDER BY data_inicio
        "#,
    )
    .bind(company_id)
    .bind(period_start)
    .bind(period_end)
    .bind(employee_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| EmployeeAllowance {
            id: r.0,
            employee_id: r.1,
            allowance_type: r.2,
            valor: r.3,
            percentual: r.4,
            data_inicio: r.5,
            data_fim: r.6,
            observacoes: r.7,
        })
        .collect())
}
