//! Domain logic
//!
//! - `catalog` - Cache-aside film, genre and person queries
//! - `sessions` - Refresh token whitelist keyed by device
//! - `access` - Accounts, roles, sections and permissions

pub mod access;
pub mod catalog;
pub mod sessions;

pub use access::{AccessError, AccessService, ClientInfo, CurrentUser};
pub use catalog::{CatalogError, FilmService, GenreService, Pagination, PersonService};
pub use sessions::{DeviceFingerprint, SessionWhitelist};
