//! API route handlers
//!
//! Catalog routes (`films`, `genres`, `persons`) need only the cache and the
//! document store; the rest are mounted when PostgreSQL is configured.

pub mod auth;
pub mod films;
pub mod genres;
pub mod health;
pub mod persons;
pub mod roles;
pub mod sections;
pub mod users;
