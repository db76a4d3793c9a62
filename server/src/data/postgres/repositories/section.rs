//! Section repository for PostgreSQL operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::data::postgres::PostgresError;
use crate::data::types::SectionRow;

pub async fn create_section(pool: &PgPool, name: &str) -> Result<SectionRow, PostgresError> {
    sqlx::query_as("INSERT INTO sections (id, name) VALUES ($1, $2) RETURNING id, name")
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|e| PostgresError::on_unique(e, "Section already exists"))
}

pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<SectionRow>, PostgresError> {
    let row = sqlx::query_as("SELECT id, name FROM sections WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_sections(pool: &PgPool) -> Result<Vec<SectionRow>, PostgresError> {
    let rows = sqlx::query_as("SELECT id, name FROM sections ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Ids from `ids` that have no section row
pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, PostgresError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let missing = sqlx::query_scalar(
        "SELECT wanted FROM UNNEST($1::uuid[]) AS wanted
         WHERE NOT EXISTS (SELECT 1 FROM sections s WHERE s.id = wanted)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(missing)
}
