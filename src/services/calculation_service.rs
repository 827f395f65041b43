//! Payroll Calculation Engine
//!
//! Turns a (company, employee, period)'s approved events into a finalized,
//! itemized paycheck. The arithmetic core (`derive_items` / `compute_totals`)
//! is pure over pre-fetched inputs; `calculate_payroll` orchestrates the
//! fetches, persists the snapshot transactionally, and gates the status
//! machine on the validation results.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    BaseCalculo, CalculationStatus, CalculationType, Employee, EventType, ItemDraft,
    PayrollCalculation, PayrollCalculationItem, PayrollEvent, PayrollRubrica, RubricaCategoria,
};
use crate::period::{Period, PeriodError};
use crate::repos::calculation_repo::{self, NewCalculation};
use crate::repos::{employee_repo, event_repo, rubrica_repo, tax_repo};
use crate::services::tax_tables::{self, TaxTables};
use crate::validation::{has_failures, validate_calculation, ValidationResult};

/// Divisor turning a monthly salary into an hourly rate
pub const MONTHLY_HOURS_DIVISOR: f64 = 220.0;

/// Divisor turning a monthly salary into a daily rate (absence discounts)
pub const MONTHLY_DAYS_DIVISOR: f64 = 30.0;

/// Overtime premium applied on top of the hourly rate
const OVERTIME_PREMIUM: f64 = 1.5;

/// Errors that abort a calculation run. Validation problems are NOT errors;
/// they come back inside the result and gate the status machine instead.
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    InvalidPeriod(#[from] PeriodError),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(Uuid),
}

/// Aggregates of a derived item set. The net/gross relation is a hard
/// invariant: salario_liquido = salario_bruto - total_descontos, always.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CalculationTotals {
    pub total_proventos: f64,
    pub total_descontos: f64,
    pub salario_bruto: f64,
    pub salario_liquido: f64,
}

/// Full outcome of one calculation run
#[derive(Debug, Clone, Serialize)]
pub struct CalculationResult {
    pub calculation: PayrollCalculation,
    pub items: Vec<PayrollCalculationItem>,
    pub total_proventos: f64,
    pub total_descontos: f64,
    pub salario_bruto: f64,
    pub salario_liquido: f64,
    pub validations: Vec<ValidationResult>,
}

/// Gross salary seen by the tax branch: base salary plus every positive,
/// non-absence event contribution.
pub fn salario_bruto_from_events(salario_base: f64, events: &[PayrollEvent]) -> f64 {
    let proventos: f64 = events
        .iter()
        .filter(|e| e.event_type != EventType::Absence && e.calculated_value > 0.0)
        .map(|e| e.calculated_value)
        .sum();

    salario_base + proventos
}

fn base_value_for(base: Option<BaseCalculo>, employee: &Employee, salario_bruto: f64) -> f64 {
    match base {
        Some(BaseCalculo::SalarioBruto) => salario_bruto,
        // salario_liquido is not known until totals are computed; percentage
        // rubricas fall back to the base salary, as does an absent config.
        Some(BaseCalculo::SalarioBase) | Some(BaseCalculo::SalarioLiquido) | None => {
            employee.salario_base
        }
    }
}

/// Synthesized item for a rubrica with no triggering events: fixed value, or
/// percentage over its configured base.
fn item_from_rubrica(
    rubrica: &PayrollRubrica,
    employee: &Employee,
    salario_bruto: f64,
) -> ItemDraft {
    let (valor_calculado, formula_aplicada) = if let Some(valor_fixo) = rubrica.valor_fixo {
        (valor_fixo, "Valor fixo".to_string())
    } else if let Some(percentual) = rubrica.percentual {
        let base = base_value_for(rubrica.base_calculo, employee, salario_bruto);
        (
            base * percentual / 100.0,
            format!("{base:.2} × {percentual:.2}%"),
        )
    } else {
        (0.0, String::new())
    };

    ItemDraft {
        rubrica_id: rubrica.id,
        codigo: rubrica.codigo.clone(),
        nome: rubrica.nome.clone(),
        tipo: rubrica.tipo,
        valor_base: employee.salario_base,
        percentual: rubrica.percentual.unwrap_or(0.0),
        valor_calculado,
        quantidade: 1.0,
        unidade: rubrica.categoria.unidade().to_string(),
        formula_aplicada,
        ordem_calculo: rubrica.ordem_calculo,
    }
}

/// Derive the payslip line set from approved events and the company's rubrica
/// configuration.
///
/// Each rubrica dispatches on its categoria. Event-driven categories only
/// produce an item when matching events exist; tax rubricas always derive
/// (their input is the gross salary, not a dedicated event stream); and any
/// mandatory rubrica still uncovered afterwards is synthesized from its
/// fixed value or percentage so INSS/FGTS can never be silently skipped.
/// The returned set is sorted by ordem_calculo.
pub fn derive_items(
    employee: &Employee,
    rubricas: &[PayrollRubrica],
    events: &[PayrollEvent],
    tax: &TaxTables,
) -> Vec<ItemDraft> {
    let salario_bruto = salario_bruto_from_events(employee.salario_base, events);

    let events_for = |categoria: RubricaCategoria| -> Vec<&PayrollEvent> {
        events
            .iter()
            .filter(|e| e.event_type.rubrica_categoria() == Some(categoria))
            .collect()
    };

    let mut items: Vec<ItemDraft> = Vec::new();

    for rubrica in rubricas {
        let item = match rubrica.categoria {
            RubricaCategoria::Salario => {
                let matching = events_for(RubricaCategoria::Salario);
                if matching.is_empty() {
                    None
                } else {
                    Some(ItemDraft {
                        rubrica_id: rubrica.id,
                        codigo: rubrica.codigo.clone(),
                        nome: rubrica.nome.clone(),
                        tipo: rubrica.tipo,
                        valor_base: employee.salario_base,
                        percentual: rubrica.percentual.unwrap_or(0.0),
                        valor_calculado: employee.salario_base,
                        quantidade: 1.0,
                        unidade: rubrica.categoria.unidade().to_string(),
                        formula_aplicada: "Salário base".to_string(),
                        ordem_calculo: rubrica.ordem_calculo,
                    })
                }
            }
            RubricaCategoria::HoraExtra => {
                let matching = events_for(RubricaCategoria::HoraExtra);
                if matching.is_empty() {
                    None
                } else {
                    let horas: f64 = matching.iter().map(|e| e.calculated_value).sum();
                    let valor = horas * (employee.salario_base / MONTHLY_HOURS_DIVISOR)
                        * OVERTIME_PREMIUM;
                    Some(ItemDraft {
                        rubrica_id: rubrica.id,
                        codigo: rubrica.codigo.clone(),
                        nome: rubrica.nome.clone(),
                        tipo: rubrica.tipo,
                        valor_base: employee.salario_base,
                        percentual: rubrica.percentual.unwrap_or(0.0),
                        valor_calculado: valor,
                        quantidade: horas,
                        unidade: rubrica.categoria.unidade().to_string(),
                        formula_aplicada: format!(
                            "Horas extras: {horas}h × (salário ÷ {MONTHLY_HOURS_DIVISOR}) × {OVERTIME_PREMIUM}"
                        ),
                        ordem_calculo: rubrica.ordem_calculo,
                    })
                }
            }
            RubricaCategoria::Beneficio => {
                let matching = events_for(RubricaCategoria::Beneficio);
                if matching.is_empty() {
                    None
                } else {
                    let valor: f64 = matching.iter().map(|e| e.calculated_value).sum();
                    Some(ItemDraft {
                        rubrica_id: rubrica.id,
                        codigo: rubrica.codigo.clone(),
                        nome: rubrica.nome.clone(),
                        tipo: rubrica.tipo,
                        valor_base: employee.salario_base,
                        percentual: rubrica.percentual.unwrap_or(0.0),
                        valor_calculado: valor,
                        quantidade: matching.len() as f64,
                        unidade: rubrica.categoria.unidade().to_string(),
                        formula_aplicada: "Benefícios consolidados".to_string(),
                        ordem_calculo: rubrica.ordem_calculo,
                    })
                }
            }
            RubricaCategoria::Adicional => {
                let matching = events_for(RubricaCategoria::Adicional);
                if matching.is_empty() {
                    None
                } else {
                    let valor: f64 = matching.iter().map(|e| e.calculated_value).sum();
                    Some(ItemDraft {
                        rubrica_id: rubrica.id,
                        codigo: rubrica.codigo.clone(),
                        nome: rubrica.nome.clone(),
                        tipo: rubrica.tipo,
                        valor_base: employee.salario_base,
                        percentual: rubrica.percentual.unwrap_or(0.0),
                        valor_calculado: valor,
                        quantidade: matching.len() as f64,
                        unidade: rubrica.categoria.unidade().to_string(),
                        formula_aplicada: "Adicionais consolidados".to_string(),
                        ordem_calculo: rubrica.ordem_calculo,
                    })
                }
            }
            RubricaCategoria::Desconto => {
                let matching = events_for(RubricaCategoria::Desconto);
                if matching.is_empty() {
                    None
                } else {
                    // Absence values arrive in days; convert to currency at
                    // the daily salary rate before they join the money sums.
                    let dias: f64 = matching.iter().map(|e| e.calculated_value.abs()).sum();
                    let valor = dias * (employee.salario_base / MONTHLY_DAYS_DIVISOR);
                    Some(ItemDraft {
                        rubrica_id: rubrica.id,
                        codigo: rubrica.codigo.clone(),
                        nome: rubrica.nome.clone(),
                        tipo: rubrica.tipo,
                        valor_base: employee.salario_base,
                        percentual: rubrica.percentual.unwrap_or(0.0),
                        valor_calculado: valor,
                        quantidade: dias,
                        unidade: rubrica.categoria.unidade().to_string(),
                        formula_aplicada: format!(
                            "Ausências: {dias} dia(s) × (salário ÷ {MONTHLY_DAYS_DIVISOR})"
                        ),
                        ordem_calculo: rubrica.ordem_calculo,
                    })
                }
            }
            RubricaCategoria::Imposto => {
                // Taxes have no dedicated event stream; they always derive
                // from the gross salary. Unknown tax codes contribute 0.
                let valor = match rubrica.codigo.as_str() {
                    "INSS" => tax_tables::inss_contribution(&tax.inss, salario_bruto),
                    "IRRF" => tax_tables::irrf_withholding(
                        &tax.irrf,
                        salario_bruto,
                        employee.dependentes,
                    ),
                    "FGTS" => tax_tables::fgts_deposit(tax.fgts_aliquota, salario_bruto),
                    _ => 0.0,
                };
                Some(ItemDraft {
                    rubrica_id: rubrica.id,
                    codigo: rubrica.codigo.clone(),
                    nome: rubrica.nome.clone(),
                    tipo: rubrica.tipo,
                    valor_base: salario_bruto,
                    percentual: rubrica.percentual.unwrap_or(0.0),
                    valor_calculado: valor,
                    quantidade: 1.0,
                    unidade: rubrica.categoria.unidade().to_string(),
                    formula_aplicada: format!("Imposto: {}", rubrica.nome),
                    ordem_calculo: rubrica.ordem_calculo,
                })
            }
        };

        if let Some(item) = item {
            items.push(item);
        }
    }

    // Mandatory rubricas not covered above still get an item
    let covered: Vec<Uuid> = items.iter().map(|i| i.rubrica_id).collect();
    for rubrica in rubricas {
        if rubrica.is_obrigatorio && !covered.contains(&rubrica.id) {
            items.push(item_from_rubrica(rubrica, employee, salario_bruto));
        }
    }

    items.sort_by_key(|i| i.ordem_calculo);
    items
}

/// Totals over a derived item set. base_calculo-typed items are reference
/// values and are excluded from both sums.
pub fn compute_totals(items: &[ItemDraft]) -> CalculationTotals {
    use crate::models::RubricaTipo;

    let total_proventos: f64 = items
        .iter()
        .filter(|i| i.tipo == RubricaTipo::Provento)
        .map(|i| i.valor_calculado)
        .sum();

    let total_descontos: f64 = items
        .iter()
        .filter(|i| i.tipo == RubricaTipo::Desconto)
        .map(|i| i.valor_calculado)
        .sum();

    let salario_bruto = total_proventos;
    let salario_liquido = salario_bruto - total_descontos;

    CalculationTotals {
        total_proventos,
        total_descontos,
        salario_bruto,
        salario_liquido,
    }
}

/// Calculate the payroll for one employee and period.
///
/// Fetches approved events, rubricas, the employee record, and tax tables;
/// derives items and totals; persists the snapshot (replacing any previous
/// run for the same scope) inside one transaction; and runs validations.
/// When any validation fails the calculation is left in `pending` instead of
/// `calculated` and the consumed events are NOT marked processed.
pub async fn calculate_payroll(
    pool: &PgPool,
    company_id: Uuid,
    employee_id: Uuid,
    period: &str,
    calculation_type: CalculationType,
) -> Result<CalculationResult, CalculationError> {
    Period::parse(period)?;

    tracing::info!(
        company_id = %company_id,
        employee_id = %employee_id,
        period,
        calculation_type = calculation_type.as_str(),
        "starting payroll calculation"
    );

    let events = event_repo::find_approved(pool, company_id, employee_id, period).await?;
    let rubricas = rubrica_repo::find_active(pool, company_id).await?;
    let employee = employee_repo::find_by_id(pool, employee_id)
        .await?
        .ok_or(CalculationError::EmployeeNotFound(employee_id))?;
    let tax = tax_repo::load_tax_tables(pool, company_id).await?;

    let items = derive_items(&employee, &rubricas, &events, &tax);
    let totals = compute_totals(&items);
    let validations = validate_calculation(&totals, &items);
    let failed = has_failures(&validations);

    let new_calculation = NewCalculation {
        company_id,
        employee_id,
        period: period.to_string(),
        calculation_type,
        calculation_data: serde_json::json!({
            "events_processed": events.len(),
            "rubricas_used": rubricas.len(),
        }),
        total_proventos: totals.total_proventos,
        total_descontos: totals.total_descontos,
        salario_bruto: totals.salario_bruto,
        salario_liquido: totals.salario_liquido,
    };

    let mut tx = pool.begin().await?;

    let (mut calculation, saved_items) =
        calculation_repo::replace_calculation(&mut tx, &new_calculation, &items).await?;

    if failed {
        calculation_repo::set_status(&mut tx, calculation.id, CalculationStatus::Pending).await?;
        calculation.status = CalculationStatus::Pending;
    } else {
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        event_repo::mark_processed(&mut tx, &event_ids).await?;
    }

    tx.commit().await?;

    tracing::info!(
        calculation_id = %calculation.id,
        salario_liquido = totals.salario_liquido,
        status = calculation.status.as_str(),
        "payroll calculation complete"
    );

    Ok(CalculationResult {
        calculation,
        items: saved_items,
        total_proventos: totals.total_proventos,
        total_descontos: totals.total_descontos,
        salario_bruto: totals.salario_bruto,
        salario_liquido: totals.salario_liquido,
        validations,
    })
}

/// Fetch an existing calculation with its items for display
pub async fn get_calculation(
    pool: &PgPool,
    company_id: Uuid,
    employee_id: Uuid,
    period: &str,
) -> Result<Option<(PayrollCalculation, Vec<PayrollCalculationItem>)>, sqlx::Error> {
    calculation_repo::find_with_items(pool, company_id, employee_id, period).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventSource, EventStatus, RubricaTipo};
    use chrono::Utc;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "expected {b}, got {a}");
    }

    fn employee(salario_base: f64, dependentes: i32) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            nome: "Maria Silva".to_string(),
            cpf: "00000000000".to_string(),
            salario_base,
            dependentes,
            data_nascimento: None,
            sexo: None,
        }
    }

    fn approved_event(event_type: EventType, value: f64) -> PayrollEvent {
        PayrollEvent {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            period: "2024-03".to_string(),
            event_type,
            event_source: EventSource::Manual,
            event_data: serde_json::json!({}),
            calculated_value: value,
            base_value: value.abs(),
            multiplier: 1.0,
            status: EventStatus::Approved,
            approved_by: None,
            approved_at: None,
            processed_at: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rubrica(
        codigo: &str,
        tipo: RubricaTipo,
        categoria: RubricaCategoria,
        ordem: i32,
        obrigatorio: bool,
    ) -> PayrollRubrica {
        PayrollRubrica {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            codigo: codigo.to_string(),
            nome: codigo.to_string(),
            tipo,
            categoria,
            valor_fixo: None,
            percentual: None,
            base_calculo: None,
            ordem_calculo: ordem,
            is_obrigatorio: obrigatorio,
            is_visivel: true,
            is_ativo: true,
        }
    }

    fn tax_fixture() -> TaxTables {
        use crate::services::tax_tables::TaxBracket;
        TaxTables {
            inss: vec![
                TaxBracket { salario_inicio: 0.0, salario_fim: 1500.0, aliquota: 0.075, parcela_dedutivel: 0.0 },
                TaxBracket { salario_inicio: 1500.01, salario_fim: 3000.0, aliquota: 0.09, parcela_dedutivel: 0.0 },
                TaxBracket { salario_inicio: 3000.01, salario_fim: 6000.0, aliquota: 0.12, parcela_dedutivel: 0.0 },
            ],
            irrf: vec![
                TaxBracket { salario_inicio: 0.0, salario_fim: 2259.20, aliquota: 0.0, parcela_dedutivel: 0.0 },
                TaxBracket { salario_inicio: 2259.21, salario_fim: 2826.65, aliquota: 0.075, parcela_dedutivel: 169.44 },
                TaxBracket { salario_inicio: 2826.66, salario_fim: 3751.05, aliquota: 0.15, parcela_dedutivel: 381.44 },
            ],
            fgts_aliquota: Some(0.08),
        }
    }

    #[test]
    fn test_salario_bruto_ignores_absences_and_negatives() {
        let events = vec![
            approved_event(EventType::Benefit, 200.0),
            approved_event(EventType::Absence, -2.0),
        ];
        approx(salario_bruto_from_events(3000.0, &events), 3200.0);
    }

    #[test]
    fn test_overtime_item_uses_monthly_divisor() {
        let emp = employee(2200.0, 0);
        let rubricas = vec![rubrica("HE50", RubricaTipo::Provento, RubricaCategoria::HoraExtra, 2, false)];
        let events = vec![approved_event(EventType::Overtime, 2.0)];

        let items = derive_items(&emp, &rubricas, &events, &TaxTables::default());
        assert_eq!(items.len(), 1);
        // 2h × (2200 / 220) × 1.5 = 30
        approx(items[0].valor_calculado, 30.0);
        approx(items[0].quantidade, 2.0);
    }

    #[test]
    fn test_absence_days_convert_to_daily_rate() {
        let emp = employee(3000.0, 0);
        let rubricas = vec![rubrica("FALTAS", RubricaTipo::Desconto, RubricaCategoria::Desconto, 3, false)];
        let events = vec![approved_event(EventType::Absence, -2.0)];

        let items = derive_items(&emp, &rubricas, &events, &TaxTables::default());
        assert_eq!(items.len(), 1);
        // 2 days × (3000 / 30) = 200
        approx(items[0].valor_calculado, 200.0);
        approx(items[0].quantidade, 2.0);
    }

    #[test]
    fn test_mandatory_taxes_present_without_events() {
        let emp = employee(3000.0, 0);
        let rubricas = vec![
            rubrica("INSS", RubricaTipo::Desconto, RubricaCategoria::Imposto, 10, true),
            rubrica("FGTS", RubricaTipo::Desconto, RubricaCategoria::Imposto, 11, true),
        ];

        let items = derive_items(&emp, &rubricas, &[], &tax_fixture());
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|i| i.codigo == "INSS"));
        assert!(items.iter().any(|i| i.codigo == "FGTS"));
        // Gross = 3000 with no events: INSS second bracket at 9%
        approx(items[0].valor_calculado, 270.0);
    }

    #[test]
    fn test_items_sorted_by_ordem_calculo() {
        let emp = employee(3000.0, 0);
        let rubricas = vec![
            rubrica("FGTS", RubricaTipo::Desconto, RubricaCategoria::Imposto, 30, true),
            rubrica("INSS", RubricaTipo::Desconto, RubricaCategoria::Imposto, 10, true),
            rubrica("BENEF", RubricaTipo::Provento, RubricaCategoria::Beneficio, 20, false),
        ];
        let events = vec![approved_event(EventType::Benefit, 100.0)];

        let items = derive_items(&emp, &rubricas, &events, &tax_fixture());
        let ordens: Vec<i32> = items.iter().map(|i| i.ordem_calculo).collect();
        assert_eq!(ordens, vec![10, 20, 30]);
    }

    #[test]
    fn test_totals_exclude_base_calculo_items() {
        let drafts = vec![
            ItemDraft {
                rubrica_id: Uuid::new_v4(),
                codigo: "SAL".to_string(),
                nome: "Salário".to_string(),
                tipo: RubricaTipo::Provento,
                valor_base: 0.0,
                percentual: 0.0,
                valor_calculado: 3000.0,
                quantidade: 1.0,
                unidade: "mês".to_string(),
                formula_aplicada: String::new(),
                ordem_calculo: 1,
            },
            ItemDraft {
                rubrica_id: Uuid::new_v4(),
                codigo: "BASE".to_string(),
                nome: "Base de cálculo".to_string(),
                tipo: RubricaTipo::BaseCalculo,
                valor_base: 0.0,
                percentual: 0.0,
                valor_calculado: 9999.0,
                quantidade: 1.0,
                unidade: "valor".to_string(),
                formula_aplicada: String::new(),
                ordem_calculo: 2,
            },
            ItemDraft {
                rubrica_id: Uuid::new_v4(),
                codigo: "INSS".to_string(),
                nome: "INSS".to_string(),
                tipo: RubricaTipo::Desconto,
                valor_base: 0.0,
                percentual: 0.0,
                valor_calculado: 270.0,
                quantidade: 1.0,
                unidade: "valor".to_string(),
                formula_aplicada: String::new(),
                ordem_calculo: 3,
            },
        ];

        let totals = compute_totals(&drafts);
        approx(totals.total_proventos, 3000.0);
        approx(totals.total_descontos, 270.0);
        approx(totals.salario_bruto, 3000.0);
        approx(totals.salario_liquido, 2730.0);
    }
}
