//! Authentication module
//!
//! - `jwt` - Access and refresh token claims
//! - `manager` - Token issuing with the configured secret
//! - `middleware` - Bearer token authentication
//! - `extractors` - Role-based authorization

mod extractors;
pub mod jwt;
mod manager;
pub mod middleware;

pub use extractors::{Admin, RequireRole, RoleRequirement};
pub use jwt::{JwtError, TokenPair};
pub use manager::TokenManager;
pub use middleware::{AuthError, AuthState, require_auth};
