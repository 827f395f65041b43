//! Repository for payroll_rubricas (pay-code definitions, read-only here)

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{BaseCalculo, PayrollRubrica, RubricaCategoria, RubricaTipo};

#[derive(Debug, sqlx::FromRow)]
struct RubricaRow {
    id: Uuid,
    company_id: Uuid,
    codigo: String,
    nome: String,
    tipo: String,
    categoria: String,
    valor_fixo: Option<f64>,
    percentual: Option<f64>,
    base_calculo: Option<String>,
    ordem_calculo: i32,
    is_obrigatorio: bool,
    is_visivel: bool,
    is_ativo: bool,
}

impl RubricaRow {
    fn into_rubrica(self) -> Result<PayrollRubrica, sqlx::Error> {
        let tipo = RubricaTipo::from_str(&self.tipo)
            .ok_or_else(|| decode_error("tipo", &self.tipo))?;
        let categoria = RubricaCategoria::from_str(&self.categoria)
            .ok_or_else(|| decode_error("categoria", &self.categoria))?;
        let base_calculo = match self.base_calculo.as_deref() {
            Some(s) => Some(BaseCalculo::from_str(s).ok_or_else(|| decode_error("base_calculo", s))?),
            None => None,
        };

        Ok(PayrollRubrica {
            id: self.id,
            company_id: self.company_id,
            codigo: self.codigo,
            nome: self.nome,
            tipo,
            categoria,
            valor_fixo: self.valor_fixo,
            percentual: self.percentual,
            base_calculo,
            ordem_calculo: self.ordem_calculo,
            is_obrigatorio: self.is_obrigatorio,
            is_visivel: self.is_visivel,
            is_ativo: self.is_ativo,
        })
    }
}

fn decode_error(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("payroll_rubricas.{column}: unknown value '{value}'").into())
}

/// Active rubricas for a company, in strict calculation order
pub async fn find_active(pool: &PgPool, company_id: Uuid) -> Result<Vec<PayrollRubrica>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RubricaRow>(
        r#"
        SELECT id, company_id, codigo, nome, tipo, categoria, valor_fixo, percentual,
               base_calculo, ordem_calculo, is_obrigatorio, is_visivel, is_ativo
        FROM payroll_rubricas
        WHERE company_id = $1
          AND is_ativo = TRUE
        ORDER BY ordem_calculo
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(RubricaRow::into_rubrica).collect()
}
