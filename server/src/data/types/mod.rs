//! Shared data types for the storage layer

mod transactional;

pub use transactional::{
    LoginHistoryRow, NewUser, PermissionGrant, PermissionRow, RoleRow, SectionRow, UserRow,
};
