//! Repository traits for the auth store
//!
//! `AccessService` talks to users, roles, sections, permissions and login
//! history only through `AccessRepository`. PostgreSQL implements it in
//! `postgres::repository_impl`; tests run against an in-memory version.

use async_trait::async_trait;
use uuid::Uuid;

use crate::data::postgres::PostgresError;
use crate::data::types::{
    LoginHistoryRow, NewUser, PermissionGrant, PermissionRow, RoleRow, SectionRow, UserRow,
};

/// Auth store operations
///
/// Unique violations surface as `PostgresError::Conflict`.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    // ==================== User Operations ====================

    /// Create a user holding `role_name` (ignored if no such role)
    async fn create_user(&self, user: &NewUser<'_>, role_name: &str)
    -> Result<UserRow, PostgresError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>, PostgresError>;

    async fn get_user_by_login(&self, login: &str) -> Result<Option<UserRow>, PostgresError>;

    /// `None` if the user is gone
    async fn update_credentials(
        &self,
        id: Uuid,
        login: &str,
        password_hash: &str,
    ) -> Result<Option<UserRow>, PostgresError>;

    /// Page of users matching `query`, with the total count
    async fn search_users(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserRow>, i64), PostgresError>;

    // ==================== User Role Operations ====================

    /// Roles held by a user, ordered by name
    async fn list_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleRow>, PostgresError>;

    async fn user_has_role(&self, user_id: Uuid, role_name: &str) -> Result<bool, PostgresError>;

    /// `false` if already held
    async fn add_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, PostgresError>;

    /// `false` if not held
    async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid)
    -> Result<bool, PostgresError>;

    // ==================== Role Operations ====================

    async fn create_role(
        &self,
        name: &str,
        grants: &[PermissionGrant],
    ) -> Result<RoleRow, PostgresError>;

    async fn get_role(&self, id: Uuid) -> Result<Option<RoleRow>, PostgresError>;

    async fn get_role_by_name(&self, name: &str) -> Result<Option<RoleRow>, PostgresError>;

    async fn list_roles(&self) -> Result<Vec<RoleRow>, PostgresError>;

    /// Rename and replace permissions; `None` if the role is gone
    async fn update_role(
        &self,
        id: Uuid,
        name: &str,
        grants: &[PermissionGrant],
    ) -> Result<Option<RoleRow>, PostgresError>;

    async fn delete_role(&self, id: Uuid) -> Result<bool, PostgresError>;

    // ==================== Section Operations ====================

    async fn create_section(&self, name: &str) -> Result<SectionRow, PostgresError>;

    async fn get_section_by_name(&self, name: &str) -> Result<Option<SectionRow>, PostgresError>;

    async fn list_sections(&self) -> Result<Vec<SectionRow>, PostgresError>;

    /// Ids from `ids` with no section row
    async fn missing_section_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, PostgresError>;

    // ==================== Permission Operations ====================

    async fn permissions_for_roles(
        &self,
        role_ids: &[Uuid],
    ) -> Result<Vec<PermissionRow>, PostgresError>;

    async fn permissions_for_section(
        &self,
        section_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<Vec<PermissionRow>, PostgresError>;

    // ==================== Login History Operations ====================

    async fn record_login(
        &self,
        user_id: Uuid,
        user_agent: &str,
        host: &str,
    ) -> Result<LoginHistoryRow, PostgresError>;

    /// Most recent entry for one user-agent/host pair
    async fn latest_login_for_device(
        &self,
        user_id: Uuid,
        user_agent: &str,
        host: &str,
    ) -> Result<Option<LoginHistoryRow>, PostgresError>;

    /// Newest first, with the total count
    async fn list_login_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<LoginHistoryRow>, i64), PostgresError>;
}
