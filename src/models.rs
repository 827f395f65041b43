//! Domain entities and enums for the payroll engine
//!
//! Status and type fields are stored as snake_case strings in Postgres and
//! mapped to enums here; the `from_str` helpers are the inverse of `as_str`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// EVENT ENUMS
// ============================================================================

/// What kind of contribution a payroll event represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TimeRecord,
    Benefit,
    Absence,
    Allowance,
    Overtime,
    Manual,
    Calculation,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeRecord => "time_record",
            Self::Benefit => "benefit",
            Self::Absence => "absence",
            Self::Allowance => "allowance",
            Self::Overtime => "overtime",
            Self::Manual => "manual",
            Self::Calculation => "calculation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "time_record" => Some(Self::TimeRecord),
            "benefit" => Some(Self::Benefit),
            "absence" => Some(Self::Absence),
            "allowance" => Some(Self::Allowance),
            "overtime" => Some(Self::Overtime),
            "manual" => Some(Self::Manual),
            "calculation" => Some(Self::Calculation),
            _ => None,
        }
    }

    /// Which rubrica category this event type feeds during calculation.
    /// Manual and calculation events carry no automatic mapping.
    pub fn rubrica_categoria(&self) -> Option<RubricaCategoria> {
        match self {
            Self::TimeRecord => Some(RubricaCategoria::Salario),
            Self::Overtime => Some(RubricaCategoria::HoraExtra),
            Self::Benefit => Some(RubricaCategoria::Beneficio),
            Self::Absence => Some(RubricaCategoria::Desconto),
            Self::Allowance => Some(RubricaCategoria::Adicional),
            Self::Manual | Self::Calculation => None,
        }
    }
}

/// Which raw collaborator produced an event (audit/traceability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    TimeRecords,
    Benefits,
    Absences,
    Manual,
    Calculation,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeRecords => "time_records",
            Self::Benefits => "benefits",
            Self::Absences => "absences",
            Self::Manual => "manual",
            Self::Calculation => "calculation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "time_records" => Some(Self::TimeRecords),
            "benefits" => Some(Self::Benefits),
            "absences" => Some(Self::Absences),
            "manual" => Some(Self::Manual),
            "calculation" => Some(Self::Calculation),
            _ => None,
        }
    }
}

/// Event approval state machine: pending -> approved | rejected -> processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processed => "processed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "processed" => Some(Self::Processed),
            _ => None,
        }
    }
}

// ============================================================================
// RUBRICA ENUMS
// ============================================================================

/// Whether a rubrica credits, debits, or is a reference-only base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricaTipo {
    Provento,
    Desconto,
    BaseCalculo,
}

impl RubricaTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provento => "provento",
            Self::Desconto => "desconto",
            Self::BaseCalculo => "base_calculo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "provento" => Some(Self::Provento),
            "desconto" => Some(Self::Desconto),
            "base_calculo" => Some(Self::BaseCalculo),
            _ => None,
        }
    }
}

/// Which branch of the calculation algorithm a rubrica follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricaCategoria {
    Salario,
    HoraExtra,
    Beneficio,
    Imposto,
    Desconto,
    Adicional,
}

impl RubricaCategoria {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salario => "salario",
            Self::HoraExtra => "hora_extra",
            Self::Beneficio => "beneficio",
            Self::Imposto => "imposto",
            Self::Desconto => "desconto",
            Self::Adicional => "adicional",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "salario" => Some(Self::Salario),
            "hora_extra" => Some(Self::HoraExtra),
            "beneficio" => Some(Self::Beneficio),
            "imposto" => Some(Self::Imposto),
            "desconto" => Some(Self::Desconto),
            "adicional" => Some(Self::Adicional),
            _ => None,
        }
    }

    /// Display unit for payslip lines of this category
    pub fn unidade(&self) -> &'static str {
        match self {
            Self::Salario => "mês",
            Self::HoraExtra => "hora",
            Self::Beneficio => "unidade",
            Self::Imposto => "valor",
            Self::Desconto => "valor",
            Self::Adicional => "unidade",
        }
    }
}

/// Which running total a percentage rubrica applies against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseCalculo {
    SalarioBase,
    SalarioBruto,
    SalarioLiquido,
}

impl BaseCalculo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SalarioBase => "salario_base",
            Self::SalarioBruto => "salario_bruto",
            Self::SalarioLiquido => "salario_liquido",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "salario_base" => Some(Self::SalarioBase),
            "salario_bruto" => Some(Self::SalarioBruto),
            "salario_liquido" => Some(Self::SalarioLiquido),
            _ => None,
        }
    }
}

// ============================================================================
// CALCULATION ENUMS
// ============================================================================

/// Why a calculation run was triggered (audit only, same algorithm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    Full,
    Incremental,
    Recalculation,
}

impl CalculationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::Recalculation => "recalculation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "full" => Some(Self::Full),
            "incremental" => Some(Self::Incremental),
            "recalculation" => Some(Self::Recalculation),
            _ => None,
        }
    }
}

/// Calculation state machine: pending -> calculated -> approved -> processed.
/// Failed validations move a calculated run back to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Pending,
    Calculated,
    Approved,
    Processed,
}

impl CalculationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Calculated => "calculated",
            Self::Approved => "approved",
            Self::Processed => "processed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "calculated" => Some(Self::Calculated),
            "approved" => Some(Self::Approved),
            "processed" => Some(Self::Processed),
            _ => None,
        }
    }
}

// ============================================================================
// PAYROLL ENTITIES
// ============================================================================

/// A normalized, atomic contribution to a paycheck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollEvent {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub period: String,
    pub event_type: EventType,
    pub event_source: EventSource,
    pub event_data: serde_json::Value,
    pub calculated_value: f64,
    pub base_value: f64,
    pub multiplier: f64,
    pub status: EventStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a payroll event, produced by a consolidation pass.
/// `source_fingerprint` is the upsert key: re-running consolidation for the
/// same period refreshes the row instead of inserting a duplicate.
#[derive(Debug, Clone)]
pub struct NewPayrollEvent {
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub period: String,
    pub event_type: EventType,
    pub event_source: EventSource,
    pub event_data: serde_json::Value,
    pub calculated_value: f64,
    pub base_value: f64,
    pub multiplier: f64,
    pub source_fingerprint: String,
}

/// A configured pay code (wage type), read-only input to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRubrica {
    pub id: Uuid,
    pub company_id: Uuid,
    pub codigo: String,
    pub nome: String,
    pub tipo: RubricaTipo,
    pub categoria: RubricaCategoria,
    pub valor_fixo: Option<f64>,
    pub percentual: Option<f64>,
    pub base_calculo: Option<BaseCalculo>,
    pub ordem_calculo: i32,
    pub is_obrigatorio: bool,
    pub is_visivel: bool,
    pub is_ativo: bool,
}

/// One snapshot of a payroll run for (company, employee, period)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollCalculation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub period: String,
    pub calculation_type: CalculationType,
    pub calculation_data: serde_json::Value,
    pub total_proventos: f64,
    pub total_descontos: f64,
    pub salario_bruto: f64,
    pub salario_liquido: f64,
    pub status: CalculationStatus,
    pub calculated_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a payslip, exclusively owned by its calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollCalculationItem {
    pub id: Uuid,
    pub calculation_id: Uuid,
    pub rubrica_id: Uuid,
    pub codigo: String,
    pub nome: String,
    pub tipo: RubricaTipo,
    pub valor_base: f64,
    pub percentual: f64,
    pub valor_calculado: f64,
    pub quantidade: f64,
    pub unidade: String,
    pub formula_aplicada: Option<String>,
    pub ordem_calculo: i32,
    pub is_manual: bool,
}

/// A payslip line before persistence, derived by the pure calculation core.
/// Rubrica identity fields are denormalized so the payslip stays stable even
/// if the rubrica definition changes later.
#[derive(Debug, Clone, Serialize)]
pub struct ItemDraft {
    pub rubrica_id: Uuid,
    pub codigo: String,
    pub nome: String,
    pub tipo: RubricaTipo,
    pub valor_base: f64,
    pub percentual: f64,
    pub valor_calculado: f64,
    pub quantidade: f64,
    pub unidade: String,
    pub formula_aplicada: String,
    pub ordem_calculo: i32,
}

// ============================================================================
// EXTERNAL COLLABORATOR RECORDS (read-only inputs)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub nome: String,
    pub cpf: String,
    pub salario_base: f64,
    pub dependentes: i32,
    pub data_nascimento: Option<NaiveDate>,
    pub sexo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub cnpj: String,
    pub razao_social: String,
}

/// One day of attendance from the time-clock module
#[derive(Debug, Clone)]
pub struct TimeRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub data: NaiveDate,
    pub hora_entrada: Option<NaiveTime>,
    pub hora_saida: Option<NaiveTime>,
    pub intervalo_inicio: Option<NaiveTime>,
    pub intervalo_fim: Option<NaiveTime>,
    pub tipo: Option<String>,
    pub justificativa: Option<String>,
}

/// How an employee benefit's value is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenefitTipo {
    ValorFixo,
    Percentual,
}

impl BenefitTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValorFixo => "valor_fixo",
            Self::Percentual => "percentual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "valor_fixo" => Some(Self::ValorFixo),
            "percentual" => Some(Self::Percentual),
            _ => None,
        }
    }
}

/// An active benefit assignment for an employee
#[derive(Debug, Clone)]
pub struct EmployeeBenefit {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub benefit_nome: String,
    pub benefit_tipo: BenefitTipo,
    pub valor: Option<f64>,
    pub percentual: Option<f64>,
    pub salario_base: Option<f64>,
    pub data_inicio: NaiveDate,
    pub data_fim: Option<NaiveDate>,
}

/// An absence span recorded against an employee
#[derive(Debug, Clone)]
pub struct EmployeeAbsence {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub absence_type: Option<String>,
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub motivo: Option<String>,
    pub atestado_medico: bool,
}

/// An active allowance assignment for an employee
#[derive(Debug, Clone)]
pub struct EmployeeAllowance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub allowance_type: Option<String>,
    pub valor: Option<f64>,
    pub percentual: Option<f64>,
    pub data_inicio: NaiveDate,
    pub data_fim: Option<NaiveDate>,
    pub observacoes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip() {
        let all = [
            EventType::TimeRecord,
            EventType::Benefit,
            EventType::Absence,
            EventType::Allowance,
            EventType::Overtime,
            EventType::Manual,
            EventType::Calculation,
        ];
        for t in all {
            assert_eq!(EventType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(EventType::from_str("bogus"), None);
    }

    #[test]
    fn test_event_type_category_mapping() {
        assert_eq!(
            EventType::TimeRecord.rubrica_categoria(),
            Some(RubricaCategoria::Salario)
        );
        assert_eq!(
            EventType::Overtime.rubrica_categoria(),
            Some(RubricaCategoria::HoraExtra)
        );
        assert_eq!(
            EventType::Benefit.rubrica_categoria(),
            Some(RubricaCategoria::Beneficio)
        );
        assert_eq!(
            EventType::Absence.rubrica_categoria(),
            Some(RubricaCategoria::Desconto)
        );
        assert_eq!(
            EventType::Allowance.rubrica_categoria(),
            Some(RubricaCategoria::Adicional)
        );
        assert_eq!(EventType::Manual.rubrica_categoria(), None);
        assert_eq!(EventType::Calculation.rubrica_categoria(), None);
    }

    #[test]
    fn test_status_serde_matches_storage_strings() {
        let json = serde_json::to_string(&EventStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        assert_eq!(CalculationStatus::Calculated.as_str(), "calculated");
        assert_eq!(
            CalculationStatus::from_str("calculated"),
            Some(CalculationStatus::Calculated)
        );
    }
}
