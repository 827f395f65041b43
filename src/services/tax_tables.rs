//! Tax bracket arithmetic (INSS, IRRF, FGTS)
//!
//! Pure lookups over pre-fetched per-company bracket tables. Bracket bounds
//! are inclusive on both ends; a value that falls outside every bracket (or a
//! missing table) yields 0 rather than an error, so payroll keeps flowing for
//! companies whose tax configuration is incomplete.

/// One progressive-table bracket. `parcela_dedutivel` is only meaningful for
/// IRRF and stays 0 for INSS rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxBracket {
    pub salario_inicio: f64,
    pub salario_fim: f64,
    pub aliquota: f64,
    pub parcela_dedutivel: f64,
}

/// Per-company tax configuration loaded once per calculation run
#[derive(Debug, Clone, Default)]
pub struct TaxTables {
    pub inss: Vec<TaxBracket>,
    pub irrf: Vec<TaxBracket>,
    pub fgts_aliquota: Option<f64>,
}

/// Monthly IRRF deduction per declared dependent (2024 table)
pub const IRRF_DEPENDENT_DEDUCTION: f64 = 189.59;

fn bracket_for(brackets: &[TaxBracket], value: f64) -> Option<&TaxBracket> {
    brackets
        .iter()
        .find(|b| value >= b.salario_inicio && value <= b.salario_fim)
}

/// INSS contribution: gross salary times the matching bracket's aliquota
pub fn inss_contribution(brackets: &[TaxBracket], salario_bruto: f64) -> f64 {
    match bracket_for(brackets, salario_bruto) {
        Some(bracket) => salario_bruto * bracket.aliquota,
        None => 0.0,
    }
}

/// IRRF withholding: the taxable base is gross salary minus the per-dependent
/// deduction; the bracket lookup runs on that base, then
/// `base * aliquota - parcela_dedutivel`.
pub fn irrf_withholding(brackets: &[TaxBracket], salario_bruto: f64, dependentes: i32) -> f64 {
    let base = salario_bruto - f64::from(dependentes.max(0)) * IRRF_DEPENDENT_DEDUCTION;

    match bracket_for(brackets, base) {
        Some(bracket) => base * bracket.aliquota - bracket.parcela_dedutivel,
        None => 0.0,
    }
}

/// FGTS deposit: gross salary times the company's configured aliquota
pub fn fgts_deposit(fgts_aliquota: Option<f64>, salario_bruto: f64) -> f64 {
    match fgts_aliquota {
        Some(aliquota) => salario_bruto * aliquota,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "expected {b}, got {a}");
    }

    fn inss_fixture() -> Vec<TaxBracket> {
        vec![
            TaxBracket { salario_inicio: 0.0, salario_fim: 1500.0, aliquota: 0.075, parcela_dedutivel: 0.0 },
            TaxBracket { salario_inicio: 1500.01, salario_fim: 3000.0, aliquota: 0.09, parcela_dedutivel: 0.0 },
            TaxBracket { salario_inicio: 3000.01, salario_fim: 6000.0, aliquota: 0.12, parcela_dedutivel: 0.0 },
        ]
    }

    fn irrf_fixture() -> Vec<TaxBracket> {
        vec![
            TaxBracket { salario_inicio: 0.0, salario_fim: 2259.20, aliquota: 0.0, parcela_dedutivel: 0.0 },
            TaxBracket { salario_inicio: 2259.21, salario_fim: 2826.65, aliquota: 0.075, parcela_dedutivel: 169.44 },
            TaxBracket { salario_inicio: 2826.66, salario_fim: 3751.05, aliquota: 0.15, parcela_dedutivel: 381.44 },
        ]
    }

    #[test]
    fn test_inss_picks_containing_bracket() {
        let brackets = inss_fixture();
        approx(inss_contribution(&brackets, 1000.0), 75.0);
        approx(inss_contribution(&brackets, 2000.0), 180.0);
        approx(inss_contribution(&brackets, 3200.0), 384.0);
    }

    #[test]
    fn test_inss_outside_all_brackets_is_zero() {
        let brackets = inss_fixture();
        approx(inss_contribution(&brackets, 10_000.0), 0.0);
        approx(inss_contribution(&[], 2000.0), 0.0);
    }

    #[test]
    fn test_irrf_exempt_band() {
        approx(irrf_withholding(&irrf_fixture(), 2000.0, 0), 0.0);
    }

    #[test]
    fn test_irrf_applies_parcela_dedutivel() {
        // 3200 * 0.15 - 381.44 = 98.56
        approx(irrf_withholding(&irrf_fixture(), 3200.0, 0), 98.56);
    }

    #[test]
    fn test_irrf_dependents_shrink_the_base() {
        // Base 3200 - 2 * 189.59 = 2820.82 -> second bracket:
        // 2820.82 * 0.075 - 169.44 = 42.1215
        approx(irrf_withholding(&irrf_fixture(), 3200.0, 2), 42.1215);
    }

    #[test]
    fn test_fgts_uses_configured_aliquota() {
        approx(fgts_deposit(Some(0.08), 3200.0), 256.0);
        approx(fgts_deposit(None, 3200.0), 0.0);
    }
}
