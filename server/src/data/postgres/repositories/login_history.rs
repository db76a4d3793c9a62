//! Login history repository (append-only)

use sqlx::PgPool;
use uuid::Uuid;

use crate::data::postgres::PostgresError;
use crate::data::types::LoginHistoryRow;

const HISTORY_COLUMNS: &str = "id, user_id, user_agent, host, created_at";

pub async fn record(
    pool: &PgPool,
    user_id: Uuid,
    user_agent: &str,
    host: &str,
) -> Result<LoginHistoryRow, PostgresError> {
    let row = sqlx::query_as(&format!(
        "INSERT INTO login_history (id, user_id, user_agent, host, created_at)
         VALUES ($1, $2, $3, $4, now())
         RETURNING {HISTORY_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(user_agent)
    .bind(host)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Most recent entry of a user for one user-agent/host pair
pub async fn latest_for_device(
    pool: &PgPool,
    user_id: Uuid,
    user_agent: &str,
    host: &str,
) -> Result<Option<LoginHistoryRow>, PostgresError> {
    let row = sqlx::query_as(&format!(
        "SELECT {HISTORY_COLUMNS} FROM login_history
         WHERE user_id = $1 AND user_agent = $2 AND host = $3
         ORDER BY created_at DESC
         LIMIT 1"
    ))
    .bind(user_id)
    .bind(user_agent)
    .bind(host)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Page of a user's history, newest first, with the total count
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<LoginHistoryRow>, i64), PostgresError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login_history WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as(&format!(
        "SELECT {HISTORY_COLUMNS} FROM login_history
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}
