//! Data storage layer
//!
//! - `cache` - In-memory and Redis caching, session hashes, rate limiting
//! - `search` - Document store for the catalog (Elasticsearch or in-memory)
//! - `postgres` - Relational auth store (users, roles, sections, history)
//! - `oauth` - Social login providers (Yandex ID)
//! - `traits` - `AccessRepository`, the auth store seam
//! - `types` - Row types shared by the repositories

pub mod cache;
pub mod oauth;
pub mod postgres;
pub mod search;
pub mod traits;
pub mod types;

pub use cache::CacheService;
pub use postgres::PostgresService;
pub use search::DocumentStore;
pub use traits::AccessRepository;
