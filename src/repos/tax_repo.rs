//! Repository for per-company tax configuration (INSS/IRRF brackets, FGTS)

use sqlx::PgPool;
use uuid::Uuid;

use crate::services::tax_tables::{TaxBracket, TaxTables};

/// Load the full tax configuration for a company in one shot.
/// Missing tables come back empty; the bracket arithmetic treats that as
/// "contribution is 0", never as an error.
pub async fn load_tax_tables(pool: &PgPool, company_id: Uuid) -> Result<TaxTables, sqlx::Error> {
    let inss = sqlx::query_as::<_, (f64, f64, f64)>(
        r#"
        SELECT salario_inicio, salario_fim, aliquota
        FROM inss_brackets
        WHERE company_id = $1
        ORDER BY salario_inicio
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(salario_inicio, salario_fim, aliquota)| TaxBracket {
        salario_inicio,
        salario_fim,
        aliquota,
        parcela_dedutivel: 0.0,
    })
    .collect();

    let irrf = sqlx::query_as::<_, (f64, f64, f64, f64)>(
        r#"
        SELECT salario_inicio, salario_fim, aliquota, parcela_dedutivel
        FROM irrf_brackets
        WHERE company_id = $1
        ORDER BY salario_inicio
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(salario_inicio, salario_fim, aliquota, parcela_dedutivel)| TaxBracket {
        salario_inicio,
        salario_fim,
        aliquota,
        parcela_dedutivel,
    })
    .collect();

    let fgts_aliquota = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT aliquota
        FROM fgts_config
        WHERE company_id = $1
        "#,
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await?;

    Ok(TaxTables {
        inss,
        irrf,
        fgts_aliquota,
    })
}
