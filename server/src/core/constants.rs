// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Cinema";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "cinema.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CINEMA_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "CINEMA_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "CINEMA_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "CINEMA_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8000;

/// Default log filter when neither CINEMA_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "cinema_server=info,tower_http=warn";

// =============================================================================
// Request Body Limits
// =============================================================================

/// Default body limit for general API requests (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Body limit for auth endpoints (64 KB)
pub const AUTH_BODY_LIMIT: usize = 64 * 1024;

// =============================================================================
// Cache
// =============================================================================

/// Environment variable for cache backend (memory, redis)
pub const ENV_CACHE_BACKEND: &str = "CINEMA_CACHE_BACKEND";

/// Environment variable for cache max entries (memory backend)
pub const ENV_CACHE_MAX_ENTRIES: &str = "CINEMA_CACHE_MAX_ENTRIES";

/// Environment variable for cache eviction policy (tinylfu, lru)
pub const ENV_CACHE_EVICTION_POLICY: &str = "CINEMA_CACHE_EVICTION_POLICY";

/// Environment variable for Redis URL
pub const ENV_CACHE_REDIS_URL: &str = "CINEMA_CACHE_REDIS_URL";

/// Environment variable for the catalog cache TTL in seconds
pub const ENV_CACHE_TTL_SECS: &str = "CINEMA_CACHE_TTL_SECS";

/// Default max entries for the in-memory cache
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 100_000;

/// Default TTL for every catalog cache entry (5 min)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Upper bound for the catalog cache TTL (10 years)
pub const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Cache key version (bump on schema changes to invalidate all cached data)
pub const CACHE_KEY_VERSION: &str = "v1";

// =============================================================================
// Search (document store)
// =============================================================================

/// Environment variable for search backend (elasticsearch, memory)
pub const ENV_SEARCH_BACKEND: &str = "CINEMA_SEARCH_BACKEND";

/// Environment variable for Elasticsearch base URL
pub const ENV_SEARCH_URL: &str = "CINEMA_SEARCH_URL";

/// Environment variable for the memory backend seed file
pub const ENV_SEARCH_SEED_PATH: &str = "CINEMA_SEARCH_SEED_PATH";

/// Default Elasticsearch base URL
pub const DEFAULT_SEARCH_URL: &str = "http://127.0.0.1:9200";

/// Default request timeout for the search backend
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

/// Film documents index
pub const INDEX_FILMS: &str = "movies";

/// Genre documents index
pub const INDEX_GENRES: &str = "genres";

/// Person documents index
pub const INDEX_PERSONS: &str = "persons";

/// Max films returned for a single person
pub const PERSON_FILMS_LIMIT: u64 = 100;

// =============================================================================
// Pagination
// =============================================================================

/// Default page number (1-based)
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Maximum page size
pub const MAX_PAGE_SIZE: u32 = 500;

/// Maximum page number (bounds the search backend offset)
pub const MAX_PAGE: u32 = 10_000;

// =============================================================================
// PostgreSQL
// =============================================================================

/// Environment variable for PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "CINEMA_POSTGRES_URL";

/// Environment variable for PostgreSQL max connections
pub const ENV_POSTGRES_MAX_CONNECTIONS: &str = "CINEMA_POSTGRES_MAX_CONNECTIONS";

/// Default PostgreSQL max connections
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Default PostgreSQL min connections
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// Default PostgreSQL acquire timeout
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default PostgreSQL idle timeout
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default PostgreSQL statement timeout
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// PostgreSQL health check interval
pub const POSTGRES_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

// =============================================================================
// Authentication
// =============================================================================

/// Environment variable for the JWT signing secret
pub const ENV_JWT_SECRET: &str = "CINEMA_JWT_SECRET";

/// Environment variable for access token lifetime in minutes
pub const ENV_ACCESS_TOKEN_TTL_MINS: &str = "CINEMA_ACCESS_TOKEN_TTL_MINS";

/// Environment variable for refresh token lifetime in minutes
pub const ENV_REFRESH_TOKEN_TTL_MINS: &str = "CINEMA_REFRESH_TOKEN_TTL_MINS";

/// Default access token lifetime (15 min)
pub const DEFAULT_ACCESS_TOKEN_TTL_MINS: u64 = 15;

/// Default refresh token lifetime (30 days)
pub const DEFAULT_REFRESH_TOKEN_TTL_MINS: u64 = 30 * 24 * 60;

/// Upper bound for token lifetimes (10 years)
pub const MAX_TOKEN_TTL_MINS: u64 = 10 * 365 * 24 * 60;

/// Minimum accepted JWT secret length in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Role granting access to role, section and user administration
pub const ROLE_ADMIN: &str = "admin";

/// Role given to every newly registered user
pub const ROLE_USER: &str = "user";

/// Column width of stored user agent and host values
pub const USER_AGENT_MAX_LEN: usize = 250;

// =============================================================================
// Social Login (Yandex OAuth)
// =============================================================================

/// Environment variable for the Yandex OAuth application id
pub const ENV_YANDEX_CLIENT_ID: &str = "CINEMA_YANDEX_CLIENT_ID";

/// Environment variable for the Yandex OAuth application secret
pub const ENV_YANDEX_CLIENT_SECRET: &str = "CINEMA_YANDEX_CLIENT_SECRET";

pub const DEFAULT_YANDEX_AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";

pub const DEFAULT_YANDEX_TOKEN_URL: &str = "https://oauth.yandex.ru/token";

pub const DEFAULT_YANDEX_PROFILE_URL: &str = "https://login.yandex.ru/info";

/// Timeout for calls to the OAuth provider
pub const DEFAULT_OAUTH_TIMEOUT_SECS: u64 = 10;

/// User agent and host recorded in login history for Yandex logins
pub const YANDEX_HISTORY_USER_AGENT: &str = "yandex";
pub const YANDEX_HISTORY_HOST: &str = "https://ya.ru";

// =============================================================================
// Rate Limiting
// =============================================================================

/// Environment variable for enabling rate limiting
pub const ENV_RATE_LIMIT_ENABLED: &str = "CINEMA_RATE_LIMIT_ENABLED";

/// Environment variable for per-IP limiting (trust X-Forwarded-For)
pub const ENV_RATE_LIMIT_PER_IP: &str = "CINEMA_RATE_LIMIT_PER_IP";

/// Environment variable for API requests per minute
pub const ENV_RATE_LIMIT_API_RPM: &str = "CINEMA_RATE_LIMIT_API_RPM";

/// Environment variable for auth requests per minute
pub const ENV_RATE_LIMIT_AUTH_RPM: &str = "CINEMA_RATE_LIMIT_AUTH_RPM";

/// Environment variable for the rate limit bypass secret
pub const ENV_RATE_LIMIT_BYPASS_HEADER: &str = "CINEMA_RATE_LIMIT_BYPASS_HEADER";

/// Default API requests per minute
pub const DEFAULT_RATE_LIMIT_API_RPM: u32 = 1000;

/// Default auth requests per minute
pub const DEFAULT_RATE_LIMIT_AUTH_RPM: u32 = 30;

/// Rate limit window in seconds (fixed 1-minute window)
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

// =============================================================================
// Shutdown
// =============================================================================

/// Max time to wait for background tasks on shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
