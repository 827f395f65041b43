//! Repository for payroll_calculations and their items
//!
//! A calculation exclusively owns its items: recalculating a (company,
//! employee, period) deletes the previous snapshot and inserts the new one
//! wholesale inside the caller's transaction, so item counts never accumulate
//! across runs.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{
    CalculationStatus, CalculationType, ItemDraft, PayrollCalculation, PayrollCalculationItem,
    RubricaTipo,
};

/// Insert payload for a calculation snapshot
#[derive(Debug, Clone)]
pub struct NewCalculation {
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub period: String,
    pub calculation_type: CalculationType,
    pub calculation_data: serde_json::Value,
    pub total_proventos: f64,
    pub total_descontos: f64,
    pub salario_bruto: f64,
    pub salario_liquido: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct CalculationRow {
    id: Uuid,
    company_id: Uuid,
    employee_id: Uuid,
    period: String,
    calculation_type: String,
    calculation_data: serde_json::Value,
    total_proventos: f64,
    total_descontos: f64,
    salario_bruto: f64,
    salario_liquido: f64,
    status: String,
    calculated_at: Option<DateTime<Utc>>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    processed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CalculationRow {
    fn into_calculation(self) -> Result<PayrollCalculation, sqlx::Error> {
        let calculation_type = CalculationType::from_str(&self.calculation_type)
            .ok_or_else(|| decode_error("calculation_type", &self.calculation_type))?;
        let status = CalculationStatus::from_str(&self.status)
            .ok_or_else(|| decode_error("status", &self.status))?;

        Ok(PayrollCalculation {
            id: self.id,
            company_id: self.company_id,
            employee_id: self.employee_id,
            period: self.period,
            calculation_type,
            calculation_data: self.calculation_data,
            total_proventos: self.total_proventos,
            total_descontos: self.total_descontos,
            salario_bruto: self.salario_bruto,
            salario_liquido: self.salario_liquido,
            status,
            calculated_at: self.calculated_at,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            processed_at: self.processed_at,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    calculation_id: Uuid,
    rubrica_id: Uuid,
    codigo: String,
    nome: String,
    tipo: String,
    valor_base: f64,
    percentual: f64,
    valor_calculado: f64,
    quantidade: f64,
    unidade: String,
    formula_aplicada: Option<String>,
    ordem_calculo: i32,
    is_manual: bool,
}

impl ItemRow {
    fn into_item(self) -> Result<PayrollCalculationItem, sqlx::Error> {
        let tipo = RubricaTipo::from_str(&self.tipo)
            .ok_or_else(|| decode_error("items.tipo", &self.tipo))?;

        Ok(PayrollCalculationItem {
            id: self.id,
            calculation_id: self.calculation_id,
            rubrica_id: self.rubrica_id,
            codigo: self.codigo,
            nome: self.nome,
            tipo,
            valor_base: self.valor_base,
            percentual: self.percentual,
            valor_calculado: self.valor_calculado,
            quantidade: self.quantidade,
            unidade: self.unidade,
            formula_aplicada: self.formula_aplicada,
            ordem_calculo: self.ordem_calculo,
            is_manual: self.is_manual,
        })
    }
}

fn decode_error(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("payroll_calculations.{column}: unknown value '{value}'").into())
}

const CALCULATION_COLUMNS: &str = "id, company_id, employee_id, period, calculation_type, \
     calculation_data, total_proventos, total_descontos, salario_bruto, salario_liquido, \
     status, calculated_at, approved_by, approved_at, processed_at, notes, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, calculation_id, rubrica_id, codigo, nome, tipo, valor_base, \
     percentual, valor_calculado, quantidade, unidade, formula_aplicada, ordem_calculo, is_manual";

/// Replace the calculation snapshot for (company, employee, period): delete
/// any prior row (items cascade) and insert the new calculation with status
/// `calculated`, then its items. Must run inside the caller's transaction.
pub async fn replace_calculation(
    tx: &mut Transaction<'_, Postgres>,
    calculation: &NewCalculation,
    items: &[ItemDraft],
) -> Result<(PayrollCalculation, Vec<PayrollCalculationItem>), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM payroll_calculations
        WHERE company_id = $1
          AND employee_id = $2
          AND period = $3
        "#,
    )
    .bind(calculation.company_id)
    .bind(calculation.employee_id)
    .bind(&calculation.period)
    .execute(&mut **tx)
    .await?;

    let insert_sql = format!(
        r#"
        INSERT INTO payroll_calculations
            (id, company_id, employee_id, period, calculation_type, calculation_data,
             total_proventos, total_descontos, salario_bruto, salario_liquido,
             status, calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'calculated', NOW())
        RETURNING {CALCULATION_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, CalculationRow>(&insert_sql)
        .bind(Uuid::new_v4())
        .bind(calculation.company_id)
        .bind(calculation.employee_id)
        .bind(&calculation.period)
        .bind(calculation.calculation_type.as_str())
        .bind(&calculation.calculation_data)
        .bind(calculation.total_proventos)
        .bind(calculation.total_descontos)
        .bind(calculation.salario_bruto)
        .bind(calculation.salario_liquido)
        .fetch_one(&mut **tx)
        .await?;

    let saved = row.into_calculation()?;

    let item_sql = format!(
        r#"
        INSERT INTO payroll_calculation_items
            (id, calculation_id, rubrica_id, codigo, nome, tipo, valor_base, percentual,
             valor_calculado, quantidade, unidade, formula_aplicada, ordem_calculo, is_manual)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, FALSE)
        RETURNING {ITEM_COLUMNS}
        "#
    );

    let mut saved_items = Vec::with_capacity(items.len());
    for item in items {
        let item_row = sqlx::query_as::<_, ItemRow>(&item_sql)
            .bind(Uuid::new_v4())
            .bind(saved.id)
            .bind(item.rubrica_id)
            .bind(&item.codigo)
            .bind(&item.nome)
            .bind(item.tipo.as_str())
            .bind(item.valor_base)
            .bind(item.percentual)
            .bind(item.valor_calculado)
            .bind(item.quantidade)
            .bind(&item.unidade)
            .bind(&item.formula_aplicada)
            .bind(item.ordem_calculo)
            .fetch_one(&mut **tx)
            .await?;

        saved_items.push(item_row.into_item()?);
    }

    Ok((saved, saved_items))
}

/// Set a calculation's status inside a transaction
pub async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    calculation_id: Uuid,
    status: CalculationStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE payroll_calculations
        SET status = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(status.as_str())
    .bind(calculation_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Fetch the calculation for (company, employee, period) with its items in
/// display order
pub async fn find_with_items(
    pool: &PgPool,
    company_id: Uuid,
    employee_id: Uuid,
    period: &str,
) -> Result<Option<(PayrollCalculation, Vec<PayrollCalculationItem>)>, sqlx::Error> {
    let calc_sql = format!(
        r#"
        SELECT {CALCULATION_COLUMNS}
        FROM payroll_calculations
        WHERE company_id = $1
          AND employee_id = $2
          AND period = $3
        "#
    );

    let row = sqlx::query_as::<_, CalculationRow>(&calc_sql)
        .bind(company_id)
        .bind(employee_id)
        .bind(period)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let calculation = row.into_calculation()?;

    let item_sql = format!(
        r#"
        SELECT {ITEM_COLUMNS}
        FROM payroll_calculation_items
        WHERE calculation_id = $1
        ORDER BY ordem_calculo
        "#
    );

    let items = sqlx::query_as::<_, ItemRow>(&item_sql)
        .bind(calculation.id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(ItemRow::into_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some((calculation, items)))
}
