//! eSocial event builders
//!
//! Each S-series event type is a strategy: a function from the employee's
//! payroll context to the government-schema payload, or `None` when the
//! prerequisites for that event are missing (e.g. no finalized calculation).
//!
//! The registry ships with the three builders that carry real field mappings
//! (S-1000, S-1200, S-5001). The remaining ~38 S-codes of the layout are
//! intentionally absent: an unregistered code produces nothing, visibly,
//! rather than succeeding as a no-op.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::models::{Company, Employee, PayrollCalculation, PayrollCalculationItem};

/// Inputs available to every builder for one (employee, period)
pub struct BuilderContext<'a> {
    pub company: &'a Company,
    pub employee: &'a Employee,
    pub period: &'a str,
    pub calculation: Option<&'a (PayrollCalculation, Vec<PayrollCalculationItem>)>,
}

/// A builder produces the event payload, or None when not applicable
pub type BuildFn = fn(&BuilderContext<'_>) -> Option<Value>;

/// Registry of event builders keyed by S-code. BTreeMap keeps iteration
/// order deterministic across runs.
pub struct BuilderRegistry {
    builders: BTreeMap<&'static str, BuildFn>,
}

impl BuilderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Registry with the builders that have real field mappings
    pub fn with_default_builders() -> Self {
        let mut registry = Self::new();
        registry.register("S-1000", build_s1000);
        registry.register("S-1200", build_s1200);
        registry.register("S-5001", build_s5001);
        registry
    }

    pub fn register(&mut self, code: &'static str, builder: BuildFn) {
        self.builders.insert(code, builder);
    }

    pub fn is_registered(&self, code: &str) -> bool {
        self.builders.contains_key(code)
    }

    /// Registered codes in deterministic order
    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builders.keys().copied()
    }

    /// Run every registered builder; returns (code, payload) for each one
    /// that was applicable to this context.
    pub fn build_all(&self, ctx: &BuilderContext<'_>) -> Vec<(&'static str, Value)> {
        self.builders
            .iter()
            .filter_map(|(code, builder)| builder(ctx).map(|payload| (*code, payload)))
            .collect()
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::with_default_builders()
    }
}

/// S-1000: employer/contributor registration info
fn build_s1000(ctx: &BuilderContext<'_>) -> Option<Value> {
    Some(json!({
        "ideEvento": {
            "tpAmb": 1,
            "procEmi": 1,
            "verProc": "1.0.0",
        },
        "ideEmpregador": {
            "tpInsc": 1,
            "nrInsc": ctx.company.cnpj,
            "nmRazao": ctx.company.razao_social,
        },
        "infoEmpregador": {
            "classTrib": "01",
            "indCoop": 0,
            "indConstr": 0,
            "indDesFolha": 0,
            "indOpcCP": 0,
            "indPorte": 1,
            "indOptRegEletron": 1,
        },
    }))
}

/// S-1200: worker remuneration under the general social-security regime.
/// Requires a finalized calculation for the period.
fn build_s1200(ctx: &BuilderContext<'_>) -> Option<Value> {
    let (calculation, _) = ctx.calculation?;

    Some(json!({
        "ideEvento": {
            "tpAmb": 1,
            "procEmi": 1,
            "verProc": "1.0.0",
        },
        "ideEmpregador": {
            "tpInsc": 1,
            "nrInsc": ctx.company.cnpj,
            "nmRazao": ctx.company.razao_social,
        },
        "ideTrabalhador": {
            "cpfTrab": ctx.employee.cpf,
            "nmTrab": ctx.employee.nome,
            "dtNascto": ctx.employee.data_nascimento,
            "sexo": ctx.employee.sexo,
        },
        "infoMV": {
            "indMV": 0,
        },
        "remuneracao": {
            "dtRemun": format!("{}-01", ctx.period),
            "vrSalFx": calculation.salario_bruto,
            "undSalFixo": 1,
        },
        "infoComplem": {
            "natAtividade": 1,
        },
    }))
}

/// S-5001: per-worker social-contribution totals, pulled from the
/// calculation's INSS/IRRF/FGTS items. Requires a finalized calculation.
fn build_s5001(ctx: &BuilderContext<'_>) -> Option<Value> {
    let (calculation, items) = ctx.calculation?;

    let contribution = |codigo: &str| -> f64 {
        items
            .iter()
            .find(|item| item.codigo == codigo)
            .map(|item| item.valor_calculado)
            .unwrap_or(0.0)
    };

    Some(json!({
        "ideEvento": {
            "tpAmb": 1,
            "procEmi": 1,
            "verProc": "1.0.0",
        },
        "ideEmpregador": {
            "tpInsc": 1,
            "nrInsc": ctx.company.cnpj,
            "nmRazao": ctx.company.razao_social,
        },
        "ideTrabalhador": {
            "cpfTrab": ctx.employee.cpf,
            "nmTrab": ctx.employee.nome,
        },
        "infoCpCalc": {
            "tpCR": 1,
            "vrCpSeg": calculation.salario_bruto,
            "vrDescSeg": contribution("INSS"),
        },
        "infoCp": {
            "classTrib": "01",
            "codCateg": 101,
            "vrsSalFx": calculation.salario_bruto,
            "undSalFixo": 1,
            "vrFGTS": contribution("FGTS"),
            "vrIRRF": contribution("IRRF"),
        },
    }))
}
