//! AccessRepository implementation for PostgreSQL

use async_trait::async_trait;
use uuid::Uuid;

use super::repositories::{login_history, permission, role, section, user};
use super::{PostgresError, PostgresService};
use crate::data::traits::AccessRepository;
use crate::data::types::{
    LoginHistoryRow, NewUser, PermissionGrant, PermissionRow, RoleRow, SectionRow, UserRow,
};

#[async_trait]
impl AccessRepository for PostgresService {
    // ==================== User Operations ====================

    async fn create_user(
        &self,
        new_user: &NewUser<'_>,
        role_name: &str,
    ) -> Result<UserRow, PostgresError> {
        user::create_user(self.pool(), new_user, role_name).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>, PostgresError> {
        user::get_user(self.pool(), id).await
    }

    async fn get_user_by_login(&self, login: &str) -> Result<Option<UserRow>, PostgresError> {
        user::get_by_login(self.pool(), login).await
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        login: &str,
        password_hash: &str,
    ) -> Result<Option<UserRow>, PostgresError> {
        user::update_credentials(self.pool(), id, login, password_hash).await
    }

    async fn search_users(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserRow>, i64), PostgresError> {
        user::search_users(self.pool(), query, limit, offset).await
    }

    // ==================== User Role Operations ====================

    async fn list_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleRow>, PostgresError> {
        user::list_roles(self.pool(), user_id).await
    }

    async fn user_has_role(&self, user_id: Uuid, role_name: &str) -> Result<bool, PostgresError> {
        user::has_role(self.pool(), user_id, role_name).await
    }

    async fn add_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, PostgresError> {
        user::add_role(self.pool(), user_id, role_id).await
    }

    async fn remove_user_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<bool, PostgresError> {
        user::remove_role(self.pool(), user_id, role_id).await
    }

    // ==================== Role Operations ====================

    async fn create_role(
        &self,
        name: &str,
        grants: &[PermissionGrant],
    ) -> Result<RoleRow, PostgresError> {
        role::create_role(self.pool(), name, grants).await
    }

    async fn get_role(&self, id: Uuid) -> Result<Option<RoleRow>, PostgresError> {
        role::get_role(self.pool(), id).await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<RoleRow>, PostgresError> {
        role::get_by_name(self.pool(), name).await
    }

    async fn list_roles(&self) -> Result<Vec<RoleRow>, PostgresError> {
        role::list_roles(self.pool()).await
    }

    async fn update_role(
        &self,
        id: Uuid,
        name: &str,
        grants: &[PermissionGrant],
    ) -> Result<Option<RoleRow>, PostgresError> {
        role::update_role(self.pool(), id, name, grants).await
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, PostgresError> {
        role::delete_role(self.pool(), id).await
    }

    // ==================== Section Operations ====================

    async fn create_section(&self, name: &str) -> Result<SectionRow, PostgresError> {
        section::create_section(self.pool(), name).await
    }

    async fn get_section_by_name(&self, name: &str) -> Result<Option<SectionRow>, PostgresError> {
        section::get_by_name(self.pool(), name).await
    }

    async fn list_sections(&self) -> Result<Vec<SectionRow>, PostgresError> {
        section::list_sections(self.pool()).await
    }

    async fn missing_section_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, PostgresError> {
        section::missing_ids(self.pool(), ids).await
    }

    // ==================== Permission Operations ====================

    async fn permissions_for_roles(
        &self,
        role_ids: &[Uuid],
    ) -> Result<Vec<PermissionRow>, PostgresError> {
        permission::list_for_roles(self.pool(), role_ids).await
    }

    async fn permissions_for_section(
        &self,
        section_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<Vec<PermissionRow>, PostgresError> {
        permission::list_for_section(self.pool(), section_id, role_ids).await
    }

    // ==================== Login History Operations ====================

    async fn record_login(
        &self,
        user_id: Uuid,
        user_agent: &str,
        host: &str,
    ) -> Result<LoginHistoryRow, PostgresError> {
        login_history::record(self.pool(), user_id, user_agent, host).await
    }

    async fn latest_login_for_device(
        &self,
        user_id: Uuid,
        user_agent: &str,
        host: &str,
    ) -> Result<Option<LoginHistoryRow>, PostgresError> {
        login_history::latest_for_device(self.pool(), user_id, user_agent, host).await
    }

    async fn list_login_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<LoginHistoryRow>, i64), PostgresError> {
        login_history::list_for_user(self.pool(), user_id, limit, offset).await
    }
}
