use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::{CacheBackendType, EvictionPolicy, SearchBackendType};
use super::constants::{
    ENV_ACCESS_TOKEN_TTL_MINS, ENV_CACHE_BACKEND, ENV_CACHE_EVICTION_POLICY,
    ENV_CACHE_MAX_ENTRIES, ENV_CACHE_REDIS_URL, ENV_CACHE_TTL_SECS, ENV_CONFIG, ENV_HOST,
    ENV_JWT_SECRET, ENV_PORT, ENV_POSTGRES_MAX_CONNECTIONS, ENV_POSTGRES_URL,
    ENV_RATE_LIMIT_API_RPM, ENV_RATE_LIMIT_AUTH_RPM, ENV_RATE_LIMIT_BYPASS_HEADER,
    ENV_RATE_LIMIT_ENABLED, ENV_RATE_LIMIT_PER_IP, ENV_REFRESH_TOKEN_TTL_MINS,
    ENV_SEARCH_BACKEND, ENV_SEARCH_SEED_PATH, ENV_SEARCH_URL, ENV_YANDEX_CLIENT_ID,
    ENV_YANDEX_CLIENT_SECRET,
};

#[derive(Parser)]
#[command(name = "cinema")]
#[command(version, about = "Movie catalog and auth API server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    // Cache options
    /// Cache backend (memory or redis)
    #[arg(long, global = true, env = ENV_CACHE_BACKEND, value_parser = parse_cache_backend_type)]
    pub cache_backend: Option<CacheBackendType>,

    /// Maximum number of cache entries
    #[arg(long, global = true, env = ENV_CACHE_MAX_ENTRIES)]
    pub cache_max_entries: Option<u64>,

    /// Cache eviction policy (tinylfu or lru)
    #[arg(long, global = true, env = ENV_CACHE_EVICTION_POLICY, value_parser = parse_eviction_policy)]
    pub cache_eviction_policy: Option<EvictionPolicy>,

    /// Redis URL (redis://host:port/db). Field expiry needs Redis 7.4+.
    #[arg(long, global = true, env = ENV_CACHE_REDIS_URL)]
    pub cache_redis_url: Option<String>,

    /// TTL in seconds for catalog cache entries
    #[arg(long, global = true, env = ENV_CACHE_TTL_SECS)]
    pub cache_ttl_secs: Option<u64>,

    // Search options
    /// Document store backend (elasticsearch or memory)
    #[arg(long, global = true, env = ENV_SEARCH_BACKEND, value_parser = parse_search_backend_type)]
    pub search_backend: Option<SearchBackendType>,

    /// Elasticsearch base URL
    #[arg(long, global = true, env = ENV_SEARCH_URL)]
    pub search_url: Option<String>,

    /// JSON fixture loaded into the memory document store
    #[arg(long, global = true, env = ENV_SEARCH_SEED_PATH)]
    pub search_seed_path: Option<PathBuf>,

    // Database options
    /// PostgreSQL connection URL. Auth routes are disabled without it.
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,

    /// PostgreSQL max pool connections
    #[arg(long, global = true, env = ENV_POSTGRES_MAX_CONNECTIONS)]
    pub postgres_max_connections: Option<u32>,

    // Auth options
    /// JWT signing secret (HS256)
    #[arg(long, global = true, env = ENV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, global = true, env = ENV_ACCESS_TOKEN_TTL_MINS)]
    pub access_token_ttl_mins: Option<u64>,

    /// Refresh token lifetime in minutes
    #[arg(long, global = true, env = ENV_REFRESH_TOKEN_TTL_MINS)]
    pub refresh_token_ttl_mins: Option<u64>,

    // Social login options
    /// Yandex OAuth application id
    #[arg(long, global = true, env = ENV_YANDEX_CLIENT_ID)]
    pub yandex_client_id: Option<String>,

    /// Yandex OAuth application secret
    #[arg(long, global = true, env = ENV_YANDEX_CLIENT_SECRET, hide_env_values = true)]
    pub yandex_client_secret: Option<String>,

    // Rate limit options
    /// Enable or disable rate limiting
    #[arg(long, global = true, env = ENV_RATE_LIMIT_ENABLED)]
    pub rate_limit_enabled: Option<bool>,

    /// Trust X-Forwarded-For when keying rate limits by client IP
    #[arg(long, global = true, env = ENV_RATE_LIMIT_PER_IP)]
    pub rate_limit_per_ip: Option<bool>,

    /// API rate limit (requests per minute)
    #[arg(long, global = true, env = ENV_RATE_LIMIT_API_RPM)]
    pub rate_limit_api_rpm: Option<u32>,

    /// Auth rate limit (requests per minute)
    #[arg(long, global = true, env = ENV_RATE_LIMIT_AUTH_RPM)]
    pub rate_limit_auth_rpm: Option<u32>,

    /// Rate limit bypass header secret
    #[arg(long, global = true, env = ENV_RATE_LIMIT_BYPASS_HEADER, hide_env_values = true)]
    pub rate_limit_bypass_header: Option<String>,
}

/// Parse cache backend type from CLI/env string
fn parse_cache_backend_type(s: &str) -> Result<CacheBackendType, String> {
    match s.to_lowercase().as_str() {
        "memory" => Ok(CacheBackendType::Memory),
        "redis" => Ok(CacheBackendType::Redis),
        _ => Err(format!(
            "Invalid cache backend '{}'. Valid options: memory, redis",
            s
        )),
    }
}

/// Parse eviction policy from CLI/env string
fn parse_eviction_policy(s: &str) -> Result<EvictionPolicy, String> {
    match s.to_lowercase().as_str() {
        "tinylfu" => Ok(EvictionPolicy::TinyLfu),
        "lru" => Ok(EvictionPolicy::Lru),
        _ => Err(format!(
            "Invalid eviction policy '{}'. Valid options: tinylfu, lru",
            s
        )),
    }
}

/// Parse search backend type from CLI/env string
fn parse_search_backend_type(s: &str) -> Result<SearchBackendType, String> {
    match s.to_lowercase().as_str() {
        "elasticsearch" | "elastic" => Ok(SearchBackendType::Elasticsearch),
        "memory" => Ok(SearchBackendType::Memory),
        _ => Err(format!(
            "Invalid search backend '{}'. Valid options: elasticsearch, memory",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Apply the database schema and exit
    Migrate,
    /// Create a user with the admin role, or grant it to an existing login
    CreateAdmin {
        /// Login of the administrator
        #[arg(long)]
        login: String,
        /// Password (ignored when the login already exists)
        #[arg(long)]
        password: String,
        /// First name for a new user
        #[arg(long, default_value = "Admin")]
        first_name: String,
        /// Last name for a new user
        #[arg(long, default_value = "Admin")]
        last_name: String,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub cache_backend: Option<CacheBackendType>,
    pub cache_max_entries: Option<u64>,
    pub cache_eviction_policy: Option<EvictionPolicy>,
    pub cache_redis_url: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub search_backend: Option<SearchBackendType>,
    pub search_url: Option<String>,
    pub search_seed_path: Option<PathBuf>,
    pub postgres_url: Option<String>,
    pub postgres_max_connections: Option<u32>,
    pub jwt_secret: Option<String>,
    pub access_token_ttl_mins: Option<u64>,
    pub refresh_token_ttl_mins: Option<u64>,
    pub yandex_client_id: Option<String>,
    pub yandex_client_secret: Option<String>,
    pub rate_limit_enabled: Option<bool>,
    pub rate_limit_per_ip: Option<bool>,
    pub rate_limit_api_rpm: Option<u32>,
    pub rate_limit_auth_rpm: Option<u32>,
    pub rate_limit_bypass_header: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        cache_backend: cli.cache_backend,
        cache_max_entries: cli.cache_max_entries,
        cache_eviction_policy: cli.cache_eviction_policy,
        cache_redis_url: cli.cache_redis_url,
        cache_ttl_secs: cli.cache_ttl_secs,
        search_backend: cli.search_backend,
        search_url: cli.search_url,
        search_seed_path: cli.search_seed_path,
        postgres_url: cli.postgres_url,
        postgres_max_connections: cli.postgres_max_connections,
        jwt_secret: cli.jwt_secret,
        access_token_ttl_mins: cli.access_token_ttl_mins,
        refresh_token_ttl_mins: cli.refresh_token_ttl_mins,
        yandex_client_id: cli.yandex_client_id,
        yandex_client_secret: cli.yandex_client_secret,
        rate_limit_enabled: cli.rate_limit_enabled,
        rate_limit_per_ip: cli.rate_limit_per_ip,
        rate_limit_api_rpm: cli.rate_limit_api_rpm,
        rate_limit_auth_rpm: cli.rate_limit_auth_rpm,
        rate_limit_bypass_header: cli.rate_limit_bypass_header,
    };
    (config, cli.command)
}
