//! Repository for employee and company lookups (external collaborators)

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Company, Employee};

/// Fetch one employee by id
pub async fn find_by_id(pool: &PgPool, employee_id: Uuid) -> Result<Option<Employee>, sqlx::Error> {
    let row = sqlx::query_as::<_, (Uuid, Uuid, String, String, f64, i32, Option<NaiveDate>, Option<String>)>(
        r#"
        SELECT id, company_id, nome, cpf, salario_base, dependentes, data_nascimento, sexo
        FROM employees
        WHERE id = $1
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Employee {
        id: r.0,
        company_id: r.1,
        nome: r.2,
        cpf: r.3,
        salario_base: r.4,
        dependentes: r.5,
        data_nascimento: r.6,
        sexo: r.7,
    }))
}

/// Active employees of a company, optionally restricted to an allow-list
pub async fn find_active_for_company(
    pool: &PgPool,
    company_id: Uuid,
    employee_ids: Option<&[Uuid]>,
) -> Result<Vec<Employee>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String, f64, i32, Option<NaiveDate>, Option<String>)>(
        r#"
        SELECT id, company_id, nome, cpf, salario_base, dependentes, data_nascimento, sexo
        FROM employees
        WHERE company_id = $1
          AND is_active = TRUE
          AND ($2::uuid[] IS NULL OR id = ANY($2))
        ORDER BY nome
        "#,
    )
    .bind(company_id)
    .bind(employee_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Employee {
            id: r.0,
            company_id: r.1,
            nome: r.2,
            cpf: r.3,
            salario_base: r.4,
            dependentes: r.5,
            data_nascimento: r.6,
            sexo: r.7,
        })
        .collect())
}

/// Fetch a company record
pub async fn find_company(pool: &PgPool, company_id: Uuid) -> Result<Option<Company>, sqlx::Error> {
    let row = sqlx::query_as::<_, (Uuid, String, String)>(
        r#"
        SELECT id, cnpj, razao_social
        FROM companies
        WHERE id = $1
        "#,
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Company {
        id: r.0,
        cnpj: r.1,
        razao_social: r.2,
    }))
}
