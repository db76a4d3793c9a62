//! Permission repository for PostgreSQL operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::data::postgres::PostgresError;
use crate::data::types::PermissionRow;

const PERMISSION_SELECT: &str = "SELECT p.id, p.role_id, p.section_id, s.name AS section_name,
        p.can_view, p.can_edit, p.can_delete
     FROM permissions p
     JOIN sections s ON s.id = p.section_id";

/// Permissions of the given roles, with section names
pub async fn list_for_roles(
    pool: &PgPool,
    role_ids: &[Uuid],
) -> Result<Vec<PermissionRow>, PostgresError> {
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as(&format!(
        "{PERMISSION_SELECT} WHERE p.role_id = ANY($1) ORDER BY s.name"
    ))
    .bind(role_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Permissions on one section granted by any of the given roles
pub async fn list_for_section(
    pool: &PgPool,
    section_id: Uuid,
    role_ids: &[Uuid],
) -> Result<Vec<PermissionRow>, PostgresError> {
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as(&format!(
        "{PERMISSION_SELECT} WHERE p.section_id = $1 AND p.role_id = ANY($2)"
    ))
    .bind(section_id)
    .bind(role_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
