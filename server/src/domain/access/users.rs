//! Profile, history, role assignment and permission checks

use uuid::Uuid;

use super::{
    AccessError, AccessService, CheckRole, CurrentUser, LoginHistoryEntry, UserPermission,
    UserPublic, hash_password,
};
use crate::core::constants::ROLE_ADMIN;
use crate::data::AccessRepository;
use crate::data::types::NewUser;
use crate::domain::catalog::Pagination;

fn limit_offset(page: Pagination) -> (i64, i64) {
    (page.size() as i64, page.offset() as i64)
}

impl AccessService {
    /// Load the principal behind an access token; `None` if the user is gone
    pub async fn current_user(&self, user_id: Uuid) -> Result<Option<CurrentUser>, AccessError> {
        let Some(row) = self.repo.get_user(user_id).await? else {
            return Ok(None);
        };
        let roles = self.repo.list_user_roles(user_id).await?;
        Ok(Some(CurrentUser {
            id: row.id,
            login: row.login,
            roles,
        }))
    }

    /// Replace login and password of the current user
    pub async fn patch_user(
        &self,
        current: &CurrentUser,
        login: &str,
        password: &str,
    ) -> Result<UserPublic, AccessError> {
        let password_hash = hash_password(password).await?;
        let row = self
            .repo
            .update_credentials(current.id, login, &password_hash)
            .await?
            .ok_or(AccessError::NotFound("User"))?;
        Ok(row.into())
    }

    /// Newest first
    pub async fn login_history(
        &self,
        current: &CurrentUser,
        page: Pagination,
    ) -> Result<(Vec<LoginHistoryEntry>, u64), AccessError> {
        let (limit, offset) = limit_offset(page);
        let (rows, total) = self
            .repo
            .list_login_history(current.id, limit, offset)
            .await?;
        Ok((rows.into_iter().map(Into::into).collect(), total.max(0) as u64))
    }

    pub async fn search_users(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<(Vec<UserPublic>, u64), AccessError> {
        let (limit, offset) = limit_offset(page);
        let (rows, total) = self.repo.search_users(query, limit, offset).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total.max(0) as u64))
    }

    pub async fn check_role(&self, user_id: Uuid, role_name: &str) -> Result<CheckRole, AccessError> {
        let has = self.repo.user_has_role(user_id, role_name).await?;
        Ok(CheckRole {
            name: role_name.to_string(),
            has,
        })
    }

    /// Grant or revoke a role by name
    pub async fn edit_user_role(
        &self,
        user_id: Uuid,
        role_name: &str,
        delete: bool,
    ) -> Result<(), AccessError> {
        let role = self
            .repo
            .get_role_by_name(role_name)
            .await?
            .ok_or_else(|| AccessError::bad_request("ROLE_NOT_FOUND", "Role does not exist"))?;
        if self.repo.get_user(user_id).await?.is_none() {
            return Err(AccessError::NotFound("User"));
        }

        if delete {
            if !self.repo.remove_user_role(user_id, role.id).await? {
                return Err(AccessError::bad_request(
                    "ROLE_NOT_ASSIGNED",
                    "User does not have this role",
                ));
            }
        } else if !self.repo.add_user_role(user_id, role.id).await? {
            return Err(AccessError::bad_request(
                "ROLE_ALREADY_ASSIGNED",
                "User already has this role",
            ));
        }

        tracing::info!(%user_id, role = %role.name, delete, "User role changed");
        Ok(())
    }

    /// Effective permission on a section across all roles of the user
    pub async fn check_permission(
        &self,
        current: &CurrentUser,
        section_name: &str,
    ) -> Result<UserPermission, AccessError> {
        let section = self
            .repo
            .get_section_by_name(section_name)
            .await?
            .ok_or_else(|| AccessError::bad_request("SECTION_NOT_FOUND", "Section does not exist"))?;
        if current.roles.is_empty() {
            return Err(AccessError::bad_request("NO_ROLES", "User has no roles"));
        }

        let rows = self
            .repo
            .permissions_for_section(section.id, &current.role_ids())
            .await?;
        UserPermission::merge(&section.name, &rows).ok_or_else(|| {
            AccessError::bad_request("NO_PERMISSIONS", "No permissions for this section")
        })
    }
}

/// Create an administrator, or grant the admin role to an existing login
pub async fn bootstrap_admin(
    repo: &dyn AccessRepository,
    login: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<UserPublic, AccessError> {
    let admin = repo
        .get_role_by_name(ROLE_ADMIN)
        .await?
        .ok_or(AccessError::NotFound("Admin role"))?;

    let row = match repo.get_user_by_login(login).await? {
        Some(existing) => {
            let granted = repo.add_user_role(existing.id, admin.id).await?;
            tracing::info!(user_id = %existing.id, granted, "Existing user promoted to admin");
            existing
        }
        None => {
            let password_hash = hash_password(password).await?;
            let created = repo
                .create_user(
                    &NewUser {
                        login,
                        password_hash: &password_hash,
                        first_name,
                        last_name,
                    },
                    ROLE_ADMIN,
                )
                .await?;
            tracing::info!(user_id = %created.id, "Admin user created");
            created
        }
    };
    Ok(row.into())
}
