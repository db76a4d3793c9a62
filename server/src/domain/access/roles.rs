//! Role management

use uuid::Uuid;

use super::{AccessError, AccessService, RoleView};
use crate::data::types::{PermissionGrant, RoleRow};

impl AccessService {
    pub async fn create_role(
        &self,
        name: &str,
        grants: &[PermissionGrant],
    ) -> Result<RoleView, AccessError> {
        self.ensure_sections(grants).await?;
        let row = self.repo.create_role(name, grants).await?;
        tracing::info!(role_id = %row.id, name, "Role created");
        self.view(row).await
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleView>, AccessError> {
        let rows = self.repo.list_roles().await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let permissions = self.repo.permissions_for_roles(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| RoleView::assemble(row, &permissions))
            .collect())
    }

    pub async fn get_role(&self, id: Uuid) -> Result<RoleView, AccessError> {
        let row = self.repo.get_role(id)
            .await?
            .ok_or(AccessError::NotFound("Role"))?;
        self.view(row).await
    }

    /// Rename and replace the permission set
    pub async fn update_role(
        &self,
        id: Uuid,
        name: &str,
        grants: &[PermissionGrant],
    ) -> Result<RoleView, AccessError> {
        if self.repo.get_role(id).await?.is_none() {
            return Err(AccessError::NotFound("Role"));
        }
        self.ensure_sections(grants).await?;
        let row = self.repo.update_role(id, name, grants)
            .await?
            .ok_or(AccessError::NotFound("Role"))?;
        self.view(row).await
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<(), AccessError> {
        if !self.repo.delete_role(id).await? {
            return Err(AccessError::NotFound("Role"));
        }
        tracing::info!(role_id = %id, "Role deleted");
        Ok(())
    }

    async fn view(&self, row: RoleRow) -> Result<RoleView, AccessError> {
        let permissions = self.repo.permissions_for_roles(&[row.id]).await?;
        Ok(RoleView::assemble(row, &permissions))
    }

    async fn ensure_sections(&self, grants: &[PermissionGrant]) -> Result<(), AccessError> {
        let mut ids: Vec<Uuid> = grants.iter().map(|g| g.section_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let missing = self.repo.missing_section_ids(&ids).await?;
        if let Some(first) = missing.first() {
            return Err(AccessError::bad_request(
                "SECTION_NOT_FOUND",
                format!("Section {first} does not exist"),
            ));
        }
        Ok(())
    }
}
