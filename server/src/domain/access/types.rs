//! Views returned by the access service

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::constants::{ROLE_ADMIN, USER_AGENT_MAX_LEN};
use crate::data::types::{LoginHistoryRow, PermissionRow, RoleRow, SectionRow, UserRow};

/// Client identity taken from request headers
///
/// Values are clipped to the stored column width; absent headers are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: String,
    pub host: String,
}

impl ClientInfo {
    pub fn new(user_agent: Option<&str>, host: Option<&str>) -> Self {
        Self {
            user_agent: clip(user_agent.unwrap_or_default()),
            host: clip(host.unwrap_or_default()),
        }
    }
}

fn clip(value: &str) -> String {
    value.chars().take(USER_AGENT_MAX_LEN).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserPublic {
    pub id: Uuid,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserRow> for UserPublic {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            login: row.login,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoginHistoryEntry {
    pub id: Uuid,
    pub user_agent: String,
    pub host: String,
    pub created_at: DateTime<Utc>,
}

impl From<LoginHistoryRow> for LoginHistoryEntry {
    fn from(row: LoginHistoryRow) -> Self {
        Self {
            id: row.id,
            user_agent: row.user_agent,
            host: row.host,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckRole {
    pub name: String,
    pub has: bool,
}

/// Effective permission of a user on one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserPermission {
    pub section: String,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl UserPermission {
    /// OR-merge the rows of every role; `None` without rows
    pub fn merge(section: &str, rows: &[PermissionRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(rows.iter().fold(
            Self {
                section: section.to_string(),
                can_view: false,
                can_edit: false,
                can_delete: false,
            },
            |acc, row| Self {
                can_view: acc.can_view || row.can_view,
                can_edit: acc.can_edit || row.can_edit,
                can_delete: acc.can_delete || row.can_delete,
                ..acc
            },
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SectionView {
    pub id: Uuid,
    pub name: String,
}

impl From<SectionRow> for SectionView {
    fn from(row: SectionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PermissionView {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub section: SectionView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleView {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<PermissionView>,
}

impl RoleView {
    /// Attach the permission rows belonging to `role`
    pub fn assemble(role: RoleRow, rows: &[PermissionRow]) -> Self {
        let permissions = rows
            .iter()
            .filter(|row| row.role_id == role.id)
            .map(|row| PermissionView {
                can_view: row.can_view,
                can_edit: row.can_edit,
                can_delete: row.can_delete,
                section: SectionView {
                    id: row.section_id,
                    name: row.section_name.clone(),
                },
            })
            .collect();
        Self {
            id: role.id,
            name: role.name,
            permissions,
        }
    }
}

/// Authenticated principal attached to the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub login: String,
    pub roles: Vec<RoleRow>,
}

impl CurrentUser {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn role_ids(&self) -> Vec<Uuid> {
        self.roles.iter().map(|r| r.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(role_id: Uuid, view: bool, edit: bool, delete: bool) -> PermissionRow {
        PermissionRow {
            id: Uuid::new_v4(),
            role_id,
            section_id: Uuid::nil(),
            section_name: "films".into(),
            can_view: view,
            can_edit: edit,
            can_delete: delete,
        }
    }

    #[test]
    fn test_client_info_clips_and_defaults() {
        let long = "x".repeat(400);
        let info = ClientInfo::new(Some(&long), None);
        assert_eq!(info.user_agent.chars().count(), USER_AGENT_MAX_LEN);
        assert_eq!(info.host, "");
    }

    #[test]
    fn test_permission_merge_is_or() {
        let rows = vec![
            perm(Uuid::new_v4(), true, false, false),
            perm(Uuid::new_v4(), false, false, true),
        ];
        let merged = UserPermission::merge("films", &rows).unwrap();
        assert!(merged.can_view);
        assert!(!merged.can_edit);
        assert!(merged.can_delete);
        assert_eq!(merged.section, "films");
    }

    #[test]
    fn test_permission_merge_empty() {
        assert!(UserPermission::merge("films", &[]).is_none());
    }

    #[test]
    fn test_role_view_filters_by_role() {
        let role = RoleRow {
            id: Uuid::new_v4(),
            name: "editor".into(),
        };
        let rows = vec![perm(role.id, true, true, false), perm(Uuid::new_v4(), true, true, true)];
        let view = RoleView::assemble(role.clone(), &rows);
        assert_eq!(view.permissions.len(), 1);
        assert_eq!(view.permissions[0].section.name, "films");
        assert!(!view.permissions[0].can_delete);
        assert_eq!(view.name, "editor");
    }

    #[test]
    fn test_current_user_roles() {
        let admin = RoleRow {
            id: Uuid::new_v4(),
            name: ROLE_ADMIN.into(),
        };
        let user = CurrentUser {
            id: Uuid::new_v4(),
            login: "root".into(),
            roles: vec![admin.clone()],
        };
        assert!(user.is_admin());
        assert_eq!(user.role_ids(), vec![admin.id]);
        assert!(!user.has_role("user"));
    }
}
