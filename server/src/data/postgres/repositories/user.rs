//! User repository for PostgreSQL operations
//!
//! Covers user rows and their role assignments.

use sqlx::PgPool;
use uuid::Uuid;

use crate::data::postgres::PostgresError;
use crate::data::types::{NewUser, RoleRow, UserRow};

const USER_COLUMNS: &str = "id, login, password_hash, first_name, last_name, created_at";

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Create a user and grant `role_name` (if it exists) in one transaction
///
/// Returns `Conflict` when the login is taken.
pub async fn create_user(
    pool: &PgPool,
    user: &NewUser<'_>,
    role_name: &str,
) -> Result<UserRow, PostgresError> {
    let mut tx = pool.begin().await?;

    let row: UserRow = sqlx::query_as(&format!(
        "INSERT INTO users (id, login, password_hash, first_name, last_name, created_at)
         VALUES ($1, $2, $3, $4, $5, now())
         RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user.login)
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.last_name)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| PostgresError::on_unique(e, "Login already exists"))?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id)
         SELECT $1, id FROM roles WHERE name = $2
         ON CONFLICT DO NOTHING",
    )
    .bind(row.id)
    .bind(role_name)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, PostgresError> {
    let row = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_by_login(pool: &PgPool, login: &str) -> Result<Option<UserRow>, PostgresError> {
    let row = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE login = $1"))
        .bind(login)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Replace login and password hash; `None` if the user is gone
pub async fn update_credentials(
    pool: &PgPool,
    id: Uuid,
    login: &str,
    password_hash: &str,
) -> Result<Option<UserRow>, PostgresError> {
    sqlx::query_as(&format!(
        "UPDATE users SET login = $2, password_hash = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(login)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .map_err(|e| PostgresError::on_unique(e, "Login already exists"))
}

/// Case-insensitive substring search on login and names, ordered by login
pub async fn search_users(
    pool: &PgPool,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserRow>, i64), PostgresError> {
    let pattern = like_pattern(query);
    let filter = "login ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {filter}"))
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE {filter} ORDER BY login LIMIT $2 OFFSET $3"
    ))
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Roles held by a user, ordered by name
pub async fn list_roles(pool: &PgPool, user_id: Uuid) -> Result<Vec<RoleRow>, PostgresError> {
    let rows = sqlx::query_as(
        "SELECT r.id, r.name FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = $1
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn has_role(pool: &PgPool, user_id: Uuid, role_name: &str) -> Result<bool, PostgresError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND r.name = $2
        )",
    )
    .bind(user_id)
    .bind(role_name)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Grant a role; `false` if already held
pub async fn add_role(pool: &PgPool, user_id: Uuid, role_id: Uuid) -> Result<bool, PostgresError> {
    let result = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Revoke a role; `false` if not held
pub async fn remove_role(
    pool: &PgPool,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<bool, PostgresError> {
    let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
