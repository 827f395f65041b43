//! Business-rule validation for consolidated events and finished calculations
//!
//! Validation failures are collected, never thrown: consolidation reports them
//! in its result, and the calculation engine uses them to gate the status
//! machine (a failed validation sends the calculation back to `pending`).

use serde::{Deserialize, Serialize};

use crate::models::{EventType, ItemDraft, PayrollEvent};
use crate::services::calculation_service::CalculationTotals;

/// Outcome of a single named validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Passed,
    Failed,
    Warning,
}

/// One validation rule result, recorded even when earlier rules failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub validation_name: String,
    pub validation_type: String,
    pub result: ValidationOutcome,
    pub message: String,
}

/// Validate a consolidated event set: value sign must match event semantics
/// (absences deduct, everything else credits) and only absences may carry a
/// negative multiplier. Violations come back as messages, one per offence.
pub fn validate_consolidated_events(events: &[PayrollEvent]) -> Vec<String> {
    let mut errors = Vec::new();

    for event in events {
        if event.employee_id.is_nil() {
            errors.push(format!("Evento {}: funcionário não informado", event.id));
        }

        match event.event_type {
            EventType::Absence => {
                if event.calculated_value > 0.0 {
                    errors.push(format!(
                        "Evento {}: ausência deve ter valor negativo, encontrado {}",
                        event.id, event.calculated_value
                    ));
                }
            }
            other => {
                if event.calculated_value < 0.0 {
                    errors.push(format!(
                        "Evento {}: valor negativo inválido para {}",
                        event.id,
                        other.as_str()
                    ));
                }
                if event.multiplier < 0.0 {
                    errors.push(format!(
                        "Evento {}: multiplicador negativo inválido para {}",
                        event.id,
                        other.as_str()
                    ));
                }
            }
        }
    }

    errors
}

/// Run the fixed calculation validations, in order, recording every outcome.
/// None short-circuits: a negative net salary does not suppress the INSS/FGTS
/// presence checks.
pub fn validate_calculation(totals: &CalculationTotals, items: &[ItemDraft]) -> Vec<ValidationResult> {
    let mut validations = Vec::new();

    if totals.salario_liquido < 0.0 {
        validations.push(ValidationResult {
            validation_name: "Salário Líquido Negativo".to_string(),
            validation_type: "consistency".to_string(),
            result: ValidationOutcome::Failed,
            message: "Salário líquido não pode ser negativo".to_string(),
        });
    }

    if !items.iter().any(|item| item.codigo == "INSS") {
        validations.push(ValidationResult {
            validation_name: "INSS Obrigatório".to_string(),
            validation_type: "legal".to_string(),
            result: ValidationOutcome::Failed,
            message: "INSS é obrigatório para todos os funcionários".to_string(),
        });
    }

    if !items.iter().any(|item| item.codigo == "FGTS") {
        validations.push(ValidationResult {
            validation_name: "FGTS Obrigatório".to_string(),
            validation_type: "legal".to_string(),
            result: ValidationOutcome::Failed,
            message: "FGTS é obrigatório para todos os funcionários".to_string(),
        });
    }

    validations
}

/// True when any validation failed (gates the calculated -> pending revert)
pub fn has_failures(validations: &[ValidationResult]) -> bool {
    validations
        .iter()
        .any(|v| v.result == ValidationOutcome::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventSource, EventStatus, RubricaTipo};
    use chrono::Utc;
    use uuid::Uuid;

    fn event(event_type: EventType, calculated_value: f64, multiplier: f64) -> PayrollEvent {
        PayrollEvent {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            period: "2024-03".to_string(),
            event_type,
            event_source: EventSource::Manual,
            event_data: serde_json::json!({}),
            calculated_value,
            base_value: 0.0,
            multiplier,
            status: EventStatus::Pending,
            approved_by: None,
            approved_at: None,
            processed_at: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(codigo: &str, tipo: RubricaTipo, valor: f64) -> ItemDraft {
        ItemDraft {
            rubrica_id: Uuid::new_v4(),
            codigo: codigo.to_string(),
            nome: codigo.to_string(),
            tipo,
            valor_base: 0.0,
            percentual: 0.0,
            valor_calculado: valor,
            quantidade: 1.0,
            unidade: "valor".to_string(),
            formula_aplicada: String::new(),
            ordem_calculo: 0,
        }
    }

    #[test]
    fn test_clean_event_set_passes() {
        let events = vec![
            event(EventType::TimeRecord, 8.0, 1.0),
            event(EventType::Absence, -2.0, -1.0),
        ];
        assert!(validate_consolidated_events(&events).is_empty());
    }

    #[test]
    fn test_negative_provento_value_is_flagged() {
        let events = vec![event(EventType::Benefit, -100.0, 1.0)];
        let errors = validate_consolidated_events(&events);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("valor negativo"));
    }

    #[test]
    fn test_positive_absence_value_is_flagged() {
        let events = vec![event(EventType::Absence, 2.0, -1.0)];
        let errors = validate_consolidated_events(&events);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("ausência"));
    }

    #[test]
    fn test_negative_multiplier_outside_absence_is_flagged() {
        let events = vec![event(EventType::Overtime, 2.0, -1.5)];
        let errors = validate_consolidated_events(&events);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("multiplicador"));
    }

    #[test]
    fn test_calculation_validations_all_recorded() {
        // Negative net AND missing both mandatory codes: all three failures
        // must be present, nothing short-circuits.
        let totals = CalculationTotals {
            total_proventos: 100.0,
            total_descontos: 300.0,
            salario_bruto: 100.0,
            salario_liquido: -200.0,
        };
        let validations = validate_calculation(&totals, &[]);
        assert_eq!(validations.len(), 3);
        assert!(has_failures(&validations));
    }

    #[test]
    fn test_calculation_validations_pass_with_mandatory_items() {
        let totals = CalculationTotals {
            total_proventos: 3000.0,
            total_descontos: 500.0,
            salario_bruto: 3000.0,
            salario_liquido: 2500.0,
        };
        let items = vec![
            item("INSS", RubricaTipo::Desconto, 300.0),
            item("FGTS", RubricaTipo::Desconto, 200.0),
        ];
        let validations = validate_calculation(&totals, &items);
        assert!(validations.is_empty());
        assert!(!has_failures(&validations));
    }
}
