//! Role repository for PostgreSQL operations
//!
//! A role owns its permission rows; writes replace them wholesale.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::data::postgres::PostgresError;
use crate::data::types::{PermissionGrant, RoleRow};

const DUPLICATE_ROLE: &str = "Role already exists";

async fn insert_permissions(
    conn: &mut PgConnection,
    role_id: Uuid,
    grants: &[PermissionGrant],
) -> Result<(), PostgresError> {
    for grant in grants {
        sqlx::query(
            "INSERT INTO permissions (id, role_id, section_id, can_view, can_edit, can_delete)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(role_id)
        .bind(grant.section_id)
        .bind(grant.can_view)
        .bind(grant.can_edit)
        .bind(grant.can_delete)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Create a role with its permissions
pub async fn create_role(
    pool: &PgPool,
    name: &str,
    grants: &[PermissionGrant],
) -> Result<RoleRow, PostgresError> {
    let mut tx = pool.begin().await?;

    let role: RoleRow = sqlx::query_as("INSERT INTO roles (id, name) VALUES ($1, $2) RETURNING id, name")
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PostgresError::on_unique(e, DUPLICATE_ROLE))?;

    insert_permissions(&mut tx, role.id, grants).await?;

    tx.commit().await?;
    Ok(role)
}

pub async fn get_role(pool: &PgPool, id: Uuid) -> Result<Option<RoleRow>, PostgresError> {
    let row = sqlx::query_as("SELECT id, name FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<RoleRow>, PostgresError> {
    let row = sqlx::query_as("SELECT id, name FROM roles WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_roles(pool: &PgPool) -> Result<Vec<RoleRow>, PostgresError> {
    let rows = sqlx::query_as("SELECT id, name FROM roles ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Rename a role and replace its permissions; `None` if the role is gone
pub async fn update_role(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    grants: &[PermissionGrant],
) -> Result<Option<RoleRow>, PostgresError> {
    let mut tx = pool.begin().await?;

    let role: Option<RoleRow> =
        sqlx::query_as("UPDATE roles SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| PostgresError::on_unique(e, DUPLICATE_ROLE))?;

    let Some(role) = role else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM permissions WHERE role_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_permissions(&mut tx, id, grants).await?;

    tx.commit().await?;
    Ok(Some(role))
}

/// Delete a role; permissions and assignments cascade
pub async fn delete_role(pool: &PgPool, id: Uuid) -> Result<bool, PostgresError> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
