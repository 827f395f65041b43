//! Scenario tests for the pure calculation core: one employee's month derived
//! end-to-end from approved events and rubrica configuration, with exact
//! numeric expectations against fixture tax tables.

use chrono::Utc;
use uuid::Uuid;

use payroll_rs::models::{
    Employee, EventSource, EventStatus, EventType, PayrollEvent, PayrollRubrica, RubricaCategoria,
    RubricaTipo,
};
use payroll_rs::services::calculation_service::{compute_totals, derive_items};
use payroll_rs::services::tax_tables::{TaxBracket, TaxTables};
use payroll_rs::validation::{has_failures, validate_calculation};

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn employee(salario_base: f64, dependentes: i32) -> Employee {
    Employee {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        nome: "João Pereira".to_string(),
        cpf: "12345678901".to_string(),
        salario_base,
        dependentes,
        data_nascimento: None,
        sexo: None,
    }
}

fn approved_event(event_type: EventType, source: EventSource, value: f64) -> PayrollEvent {
    PayrollEvent {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        employee_id: Uuid::new_v4(),
        period: "2024-03".to_string(),
        event_type,
        event_source: source,
        event_data: serde_json::json!({}),
        calculated_value: value,
        base_value: value.abs(),
        multiplier: if value < 0.0 { -1.0 } else { 1.0 },
        status: EventStatus::Approved,
        approved_by: Some("rh@empresa".to_string()),
        approved_at: Some(Utc::now()),
        processed_at: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn rubrica(
    codigo: &str,
    nome: &str,
    tipo: RubricaTipo,
    categoria: RubricaCategoria,
    ordem: i32,
    obrigatorio: bool,
) -> PayrollRubrica {
    PayrollRubrica {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        codigo: codigo.to_string(),
        nome: nome.to_string(),
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

/// The standard rubrica set used by the scenario tests, in calculation order
fn rubrica_set() -> Vec<PayrollRubrica> {
    vec![
        rubrica("SALARIO", "Salário base", RubricaTipo::Provento, RubricaCategoria::Salario, 1, true),
        rubrica("HE50", "Horas extras 50%", RubricaTipo::Provento, RubricaCategoria::HoraExtra, 2, false),
        rubrica("BENEF", "Benefícios", RubricaTipo::Provento, RubricaCategoria::Beneficio, 3, false),
        rubrica("FALTAS", "Faltas e ausências", RubricaTipo::Desconto, RubricaCategoria::Desconto, 4, false),
        rubrica("INSS", "INSS", RubricaTipo::Desconto, RubricaCategoria::Imposto, 10, true),
        rubrica("IRRF", "IRRF", RubricaTipo::Desconto, RubricaCategoria::Imposto, 11, true),
        rubrica("FGTS", "FGTS", RubricaTipo::Desconto, RubricaCategoria::Imposto, 12, true),
    ]
}

fn tax_fixture() -> TaxTables {
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
fn test_full_month_scenario_exact_values() {
    // Employee at 3000/month, one fixed benefit of 200, two days absent,
    // a normal worked day, no overtime.
    let emp = employee(3000.0, 0);
    let events = vec![
        approved_event(EventType::TimeRecord, EventSource::TimeRecords, 8.0),
        approved_event(EventType::Benefit, EventSource::Benefits, 200.0),
        approved_event(EventType::Absence, EventSource::Absences, -2.0),
    ];

    let items = derive_items(&emp, &rubrica_set(), &events, &tax_fixture());
    let totals = compute_totals(&items);

    let valor = |codigo: &str| -> f64 {
        items
            .iter()
            .find(|i| i.codigo == codigo)
            .unwrap_or_else(|| panic!("missing item {codigo}"))
            .valor_calculado
    };

    approx(valor("SALARIO"), 3000.0);
    approx(valor("BENEF"), 200.0);
    // 2 days at the daily rate 3000/30
    approx(valor("FALTAS"), 200.0);
    // Gross for taxes sums every positive event value over the base salary:
    // 3000 + 8 (worked hours) + 200 = 3208, third INSS bracket at 12%
    approx(valor("INSS"), 384.96);
    // 3208 * 0.15 - 381.44
    approx(valor("IRRF"), 99.76);
    // 3208 * 0.08
    approx(valor("FGTS"), 256.64);

    approx(totals.salario_bruto, 3200.0);
    approx(totals.total_descontos, 941.36);
    approx(totals.salario_liquido, 2258.64);

    // Net/gross relation holds exactly
    approx(
        totals.salario_liquido,
        totals.salario_bruto - totals.total_descontos,
    );

    // No overtime item: no overtime events existed and HE50 is not mandatory
    assert!(!items.iter().any(|i| i.codigo == "HE50"));

    let validations = validate_calculation(&totals, &items);
    assert!(!has_failures(&validations));
}

#[test]
fn test_mandatory_rubricas_present_without_any_events() {
    let emp = employee(2000.0, 0);

    let items = derive_items(&emp, &rubrica_set(), &[], &tax_fixture());

    // INSS/FGTS/IRRF derive from gross salary alone; SALARIO is mandatory and
    // gets synthesized even with no time records.
    for codigo in ["SALARIO", "INSS", "IRRF", "FGTS"] {
        assert!(
            items.iter().any(|i| i.codigo == codigo),
            "expected mandatory item {codigo}"
        );
    }

    // Second INSS bracket at 9%
    let inss = items.iter().find(|i| i.codigo == "INSS").unwrap();
    approx(inss.valor_calculado, 180.0);
}

#[test]
fn test_items_come_back_in_calculation_order() {
    let emp = employee(3000.0, 0);
    let events = vec![
        approved_event(EventType::TimeRecord, EventSource::TimeRecords, 8.0),
        approved_event(EventType::Overtime, EventSource::TimeRecords, 2.0),
        approved_event(EventType::Benefit, EventSource::Benefits, 150.0),
    ];

    let items = derive_items(&emp, &rubrica_set(), &events, &tax_fixture());

    let ordens: Vec<i32> = items.iter().map(|i| i.ordem_calculo).collect();
    let mut sorted = ordens.clone();
    sorted.sort();
    assert_eq!(ordens, sorted);
    assert_eq!(items[0].codigo, "SALARIO");
}

#[test]
fn test_negative_net_salary_fails_validation() {
    // Salary small enough that a long absence pushes net below zero
    let emp = employee(300.0, 0);
    let events = vec![
        approved_event(EventType::TimeRecord, EventSource::TimeRecords, 8.0),
        approved_event(EventType::Absence, EventSource::Absences, -31.0),
    ];

    let items = derive_items(&emp, &rubrica_set(), &events, &tax_fixture());
    let totals = compute_totals(&items);
    assert!(totals.salario_liquido < 0.0);

    let validations = validate_calculation(&totals, &items);
    assert!(has_failures(&validations));
    assert!(validations
        .iter()
        .any(|v| v.message.contains("não pode ser negativo")));
}

#[test]
fn test_missing_mandatory_rubricas_fail_validation() {
    // A company misconfigured without INSS/FGTS rubricas: derivation cannot
    // invent them, so validation must flag both.
    let emp = employee(3000.0, 0);
    let rubricas = vec![rubrica(
        "SALARIO",
        "Salário base",
        RubricaTipo::Provento,
        RubricaCategoria::Salario,
        1,
        true,
    )];
    let events = vec![approved_event(
        EventType::TimeRecord,
        EventSource::TimeRecords,
        8.0,
    )];

    let items = derive_items(&emp, &rubricas, &events, &tax_fixture());
    let totals = compute_totals(&items);
    let validations = validate_calculation(&totals, &items);

    assert_eq!(validations.len(), 2);
    assert!(has_failures(&validations));
}

#[test]
fn test_dependents_reduce_irrf_base() {
    let emp = employee(3000.0, 2);
    let events = vec![
        approved_event(EventType::TimeRecord, EventSource::TimeRecords, 8.0),
        approved_event(EventType::Benefit, EventSource::Benefits, 200.0),
    ];

    let items = derive_items(&emp, &rubrica_set(), &events, &tax_fixture());

    // Tax gross 3000 + 8 + 200 = 3208; base 3208 - 2 * 189.59 = 2828.82,
    // third bracket: 2828.82 * 0.15 - 381.44 = 42.883
    let irrf = items.iter().find(|i| i.codigo == "IRRF").unwrap();
    approx(irrf.valor_calculado, 42.883);
}
