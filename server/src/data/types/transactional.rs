//! Row types for the PostgreSQL auth store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// User types
// ============================================================================

/// User row from database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub login: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub login: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

// ============================================================================
// Role and section types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleRow {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SectionRow {
    pub id: Uuid,
    pub name: String,
}

/// Permission row joined with its section name
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PermissionRow {
    pub id: Uuid,
    pub role_id: Uuid,
    pub section_id: Uuid,
    pub section_name: String,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Permission to attach to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    pub section_id: Uuid,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

// ============================================================================
// Login history
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LoginHistoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_agent: String,
    pub host: String,
    pub created_at: DateTime<Utc>,
}
