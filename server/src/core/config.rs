use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_ACCESS_TOKEN_TTL_MINS, DEFAULT_CACHE_MAX_ENTRIES,
    DEFAULT_CACHE_TTL_SECS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RATE_LIMIT_API_RPM,
    DEFAULT_RATE_LIMIT_AUTH_RPM, DEFAULT_REFRESH_TOKEN_TTL_MINS, DEFAULT_SEARCH_TIMEOUT_SECS,
    DEFAULT_SEARCH_URL, DEFAULT_YANDEX_AUTHORIZE_URL, DEFAULT_YANDEX_PROFILE_URL,
    DEFAULT_YANDEX_TOKEN_URL, MAX_CACHE_TTL_SECS, MAX_TOKEN_TTL_MINS, MIN_JWT_SECRET_LEN, POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS, POSTGRES_DEFAULT_MAX_CONNECTIONS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
};

// =============================================================================
// Cache Backend Enum
// =============================================================================

/// Cache backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendType {
    #[default]
    Memory,
    Redis,
}

impl fmt::Display for CacheBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackendType::Memory => write!(f, "memory"),
            CacheBackendType::Redis => write!(f, "redis"),
        }
    }
}

// =============================================================================
// Eviction Policy Enum
// =============================================================================

/// Cache eviction policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// TinyLFU - LRU eviction + LFU admission (near-optimal hit ratio)
    #[default]
    TinyLfu,
    /// Simple LRU (better for recency-biased workloads)
    Lru,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::TinyLfu => write!(f, "tinylfu"),
            EvictionPolicy::Lru => write!(f, "lru"),
        }
    }
}

// =============================================================================
// Search Backend Enum
// =============================================================================

/// Document store backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackendType {
    #[default]
    Elasticsearch,
    /// In-process store (development and tests)
    Memory,
}

impl fmt::Display for SearchBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackendType::Elasticsearch => write!(f, "elasticsearch"),
            SearchBackendType::Memory => write!(f, "memory"),
        }
    }
}

// =============================================================================
// File Config Structs (all Option<T> for partial configs)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Redis cache configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RedisFileConfig {
    pub url: Option<String>,
}

/// Memory cache configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MemoryCacheFileConfig {
    pub max_entries: Option<u64>,
    pub eviction_policy: Option<EvictionPolicy>,
}

/// Cache configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CacheFileConfig {
    pub backend: Option<CacheBackendType>,
    /// TTL applied to every catalog entry
    pub ttl_secs: Option<u64>,
    pub redis: Option<RedisFileConfig>,
    pub memory: Option<MemoryCacheFileConfig>,
}

/// Search configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFileConfig {
    pub backend: Option<SearchBackendType>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub seed_path: Option<PathBuf>,
}

/// PostgreSQL configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresFileConfig {
    /// PostgreSQL connection URL (or use CINEMA_POSTGRES_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool (default: 20)
    pub max_connections: Option<u32>,
    /// Minimum number of connections to keep warm (default: 2)
    pub min_connections: Option<u32>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Statement timeout in seconds, 0 to disable (default: 60)
    pub statement_timeout_secs: Option<u64>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub secret: Option<String>,
    pub access_token_ttl_mins: Option<u64>,
    pub refresh_token_ttl_mins: Option<u64>,
}

/// Yandex OAuth configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct YandexFileConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub profile_url: Option<String>,
}

/// Rate limit configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RateLimitFileConfig {
    pub enabled: Option<bool>,
    pub per_ip: Option<bool>,
    pub api_rpm: Option<u32>,
    pub auth_rpm: Option<u32>,
    pub bypass_header: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub cache: Option<CacheFileConfig>,
    pub search: Option<SearchFileConfig>,
    pub postgres: Option<PostgresFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub yandex: Option<YandexFileConfig>,
    pub rate_limit: Option<RateLimitFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Runtime Config Structs
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Cache configuration (used internally by CacheService)
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Cache backend type
    pub backend: CacheBackendType,
    /// Maximum entries (memory backend)
    pub max_entries: u64,
    /// Eviction policy (memory backend)
    pub eviction_policy: EvictionPolicy,
    /// Redis URL (redis backend)
    pub redis_url: Option<String>,
    /// TTL for catalog entries in seconds
    pub ttl_secs: u64,
}

/// Document store configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub backend: SearchBackendType,
    /// Elasticsearch base URL (no trailing slash)
    pub url: String,
    pub timeout_secs: u64,
    /// Optional fixture for the memory backend
    pub seed_path: Option<PathBuf>,
}

/// PostgreSQL configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Statement timeout in seconds (0 = disabled)
    pub statement_timeout_secs: u64,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret. None means an ephemeral key is generated at startup.
    pub secret: Option<String>,
    pub access_token_ttl_mins: u64,
    pub refresh_token_ttl_mins: u64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("access_token_ttl_mins", &self.access_token_ttl_mins)
            .field("refresh_token_ttl_mins", &self.refresh_token_ttl_mins)
            .finish()
    }
}

/// Yandex OAuth application (final/runtime)
#[derive(Clone)]
pub struct YandexConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
}

impl fmt::Debug for YandexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YandexConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("profile_url", &self.profile_url)
            .finish()
    }
}

/// Rate limit configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Trust X-Forwarded-For for the client identifier
    pub per_ip: bool,
    pub api_rpm: u32,
    pub auth_rpm: u32,
    pub bypass_header: Option<String>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    /// None disables the auth routes
    pub postgres: Option<PostgresConfig>,
    pub auth: AuthConfig,
    /// None disables social login
    pub yandex: Option<YandexConfig>,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let config_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match config_path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        let config = Self::from_sources(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            cache_backend = %config.cache.backend,
            cache_ttl_secs = config.cache.ttl_secs,
            search_backend = %config.search.backend,
            postgres = config.postgres.is_some(),
            yandex = config.yandex.is_some(),
            rate_limit_enabled = config.rate_limit.enabled,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn from_sources(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_cache = file_config.cache.unwrap_or_default();
        let file_redis = file_cache.redis.unwrap_or_default();
        let file_memory = file_cache.memory.unwrap_or_default();
        let file_search = file_config.search.unwrap_or_default();
        let file_postgres = file_config.postgres.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();
        let file_yandex = file_config.yandex.unwrap_or_default();
        let file_rate_limit = file_config.rate_limit.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let cache = CacheConfig {
            backend: cli.cache_backend.or(file_cache.backend).unwrap_or_default(),
            max_entries: cli
                .cache_max_entries
                .or(file_memory.max_entries)
                .unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
            eviction_policy: cli
                .cache_eviction_policy
                .or(file_memory.eviction_policy)
                .unwrap_or_default(),
            redis_url: cli.cache_redis_url.clone().or(file_redis.url),
            ttl_secs: cli
                .cache_ttl_secs
                .or(file_cache.ttl_secs)
                .unwrap_or(DEFAULT_CACHE_TTL_SECS),
        };

        let search = SearchConfig {
            backend: cli
                .search_backend
                .or(file_search.backend)
                .unwrap_or_default(),
            url: cli
                .search_url
                .clone()
                .or(file_search.url)
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: file_search
                .timeout_secs
                .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
            seed_path: cli.search_seed_path.clone().or(file_search.seed_path),
        };

        let postgres = cli
            .postgres_url
            .clone()
            .or(file_postgres.url)
            .map(|url| PostgresConfig {
                url,
                max_connections: cli
                    .postgres_max_connections
                    .or(file_postgres.max_connections)
                    .unwrap_or(POSTGRES_DEFAULT_MAX_CONNECTIONS),
                min_connections: file_postgres
                    .min_connections
                    .unwrap_or(POSTGRES_DEFAULT_MIN_CONNECTIONS),
                acquire_timeout_secs: file_postgres
                    .acquire_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS),
                idle_timeout_secs: file_postgres
                    .idle_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS),
                statement_timeout_secs: file_postgres
                    .statement_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS),
            });

        let auth = AuthConfig {
            secret: cli.jwt_secret.clone().or(file_auth.secret),
            access_token_ttl_mins: cli
                .access_token_ttl_mins
                .or(file_auth.access_token_ttl_mins)
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINS),
            refresh_token_ttl_mins: cli
                .refresh_token_ttl_mins
                .or(file_auth.refresh_token_ttl_mins)
                .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_MINS),
        };

        // Social login needs both halves of the application credentials
        let yandex = cli
            .yandex_client_id
            .clone()
            .or(file_yandex.client_id)
            .zip(cli.yandex_client_secret.clone().or(file_yandex.client_secret))
            .map(|(client_id, client_secret)| YandexConfig {
                client_id,
                client_secret,
                authorize_url: file_yandex
                    .authorize_url
                    .unwrap_or_else(|| DEFAULT_YANDEX_AUTHORIZE_URL.to_string()),
                token_url: file_yandex
                    .token_url
                    .unwrap_or_else(|| DEFAULT_YANDEX_TOKEN_URL.to_string()),
                profile_url: file_yandex
                    .profile_url
                    .unwrap_or_else(|| DEFAULT_YANDEX_PROFILE_URL.to_string()),
            });

        let rate_limit = RateLimitConfig {
            enabled: cli
                .rate_limit_enabled
                .or(file_rate_limit.enabled)
                .unwrap_or(false),
            per_ip: cli
                .rate_limit_per_ip
                .or(file_rate_limit.per_ip)
                .unwrap_or(false),
            api_rpm: cli
                .rate_limit_api_rpm
                .or(file_rate_limit.api_rpm)
                .unwrap_or(DEFAULT_RATE_LIMIT_API_RPM),
            auth_rpm: cli
                .rate_limit_auth_rpm
                .or(file_rate_limit.auth_rpm)
                .unwrap_or(DEFAULT_RATE_LIMIT_AUTH_RPM),
            bypass_header: cli
                .rate_limit_bypass_header
                .clone()
                .or(file_rate_limit.bypass_header),
        };

        Self {
            server,
            cache,
            search,
            postgres,
            auth,
            yandex,
            rate_limit,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.cache.backend == CacheBackendType::Redis
            && self.cache.redis_url.as_ref().is_none_or(|u| u.is_empty())
        {
            anyhow::bail!(
                "Configuration error: cache.redis.url is required when cache.backend is 'redis'"
            );
        }
        if self.cache.ttl_secs == 0 {
            anyhow::bail!("Configuration error: cache.ttl_secs must be greater than 0");
        }
        if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            anyhow::bail!(
                "Configuration error: cache.ttl_secs must be at most {}",
                MAX_CACHE_TTL_SECS
            );
        }

        if self.search.backend == SearchBackendType::Elasticsearch
            && !self.search.url.starts_with("http://")
            && !self.search.url.starts_with("https://")
        {
            anyhow::bail!(
                "Configuration error: search.url must start with http:// or https://. Got: {}",
                self.search.url
            );
        }
        if self.search.seed_path.is_some() && self.search.backend != SearchBackendType::Memory {
            tracing::warn!("search.seed_path is only used by the memory search backend");
        }

        if let Some(ref pg) = self.postgres
            && pg.url.is_empty()
        {
            anyhow::bail!("Configuration error: postgres.url must not be empty");
        }

        if let Some(ref secret) = self.auth.secret {
            if secret.is_empty() {
                anyhow::bail!("Configuration error: auth.secret must not be empty");
            }
            if secret.len() < MIN_JWT_SECRET_LEN {
                tracing::warn!(
                    min_len = MIN_JWT_SECRET_LEN,
                    "auth.secret is shorter than recommended for HS256"
                );
            }
        }
        if self.auth.access_token_ttl_mins == 0 || self.auth.refresh_token_ttl_mins == 0 {
            anyhow::bail!("Configuration error: token lifetimes must be greater than 0");
        }
        if self.auth.access_token_ttl_mins > MAX_TOKEN_TTL_MINS
            || self.auth.refresh_token_ttl_mins > MAX_TOKEN_TTL_MINS
        {
            anyhow::bail!(
                "Configuration error: token lifetimes must be at most {} minutes",
                MAX_TOKEN_TTL_MINS
            );
        }
        if self.auth.refresh_token_ttl_mins < self.auth.access_token_ttl_mins {
            tracing::warn!(
                "auth.refresh_token_ttl_mins is shorter than auth.access_token_ttl_mins"
            );
        }

        if let Some(ref yandex) = self.yandex {
            if yandex.client_id.is_empty() || yandex.client_secret.is_empty() {
                anyhow::bail!(
                    "Configuration error: yandex.client_id and yandex.client_secret must not be empty"
                );
            }
            for url in [&yandex.authorize_url, &yandex.token_url, &yandex.profile_url] {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!(
                        "Configuration error: yandex URLs must start with http:// or https://. Got: {}",
                        url
                    );
                }
            }
            if self.postgres.is_none() {
                tracing::warn!("Yandex login is configured but PostgreSQL is not, social login disabled");
            }
        }

        if self.rate_limit.enabled && self.rate_limit.api_rpm == 0 {
            tracing::warn!("rate_limit.api_rpm is 0, all API requests will be blocked");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_with(cli: CliConfig, json: &str) -> AppConfig {
        let file_config: FileConfig = serde_json::from_str(json).unwrap();
        AppConfig::from_sources(&cli, file_config)
    }

    #[test]
    fn test_backend_serde_and_display() {
        let backend: SearchBackendType = serde_json::from_str(r#""memory""#).unwrap();
        assert_eq!(backend, SearchBackendType::Memory);
        assert_eq!(SearchBackendType::Elasticsearch.to_string(), "elasticsearch");
        assert_eq!(CacheBackendType::Redis.to_string(), "redis");
        assert_eq!(EvictionPolicy::TinyLfu.to_string(), "tinylfu");
    }

    #[test]
    fn test_defaults() {
        let config = load_with(CliConfig::default(), "{}");
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.cache.backend, CacheBackendType::Memory);
        assert_eq!(config.cache.ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.search.backend, SearchBackendType::Elasticsearch);
        assert_eq!(config.search.url, DEFAULT_SEARCH_URL);
        assert!(config.postgres.is_none());
        assert!(config.auth.secret.is_none());
        assert!(!config.rate_limit.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_file_config_parse_full() {
        let config = load_with(
            CliConfig::default(),
            r#"{
                "server": { "host": "0.0.0.0", "port": 8080 },
                "cache": { "backend": "redis", "ttl_secs": 60, "redis": { "url": "redis://cache:6379/0" } },
                "search": { "backend": "elasticsearch", "url": "http://es:9200/" },
                "postgres": { "url": "postgres://u:p@db/auth", "max_connections": 5 },
                "auth": { "access_token_ttl_mins": 5 }
            }"#,
        );
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.backend, CacheBackendType::Redis);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.search.url, "http://es:9200");
        let pg = config.postgres.as_ref().unwrap();
        assert_eq!(pg.max_connections, 5);
        assert_eq!(pg.min_connections, POSTGRES_DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.auth.access_token_ttl_mins, 5);
        assert_eq!(
            config.auth.refresh_token_ttl_mins,
            DEFAULT_REFRESH_TOKEN_TTL_MINS
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = CliConfig {
            port: Some(3000),
            cache_ttl_secs: Some(10),
            search_backend: Some(SearchBackendType::Memory),
            jwt_secret: Some("x".repeat(40)),
            ..Default::default()
        };
        let config = load_with(
            cli,
            r#"{ "server": { "port": 8080 }, "cache": { "ttl_secs": 60 }, "auth": { "secret": "file" } }"#,
        );
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cache.ttl_secs, 10);
        assert_eq!(config.search.backend, SearchBackendType::Memory);
        assert_eq!(config.auth.secret.as_deref(), Some("x".repeat(40).as_str()));
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let config: FileConfig = serde_json::from_str(r#"{ "servr": {} }"#).unwrap();
        assert!(config.extra.get("servr").is_some());
    }

    #[test]
    fn test_validation_redis_url_required() {
        let cli = CliConfig {
            cache_backend: Some(CacheBackendType::Redis),
            ..Default::default()
        };
        let config = load_with(cli, "{}");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("cache.redis.url"));
    }

    #[test]
    fn test_validation_zero_ttl_rejected() {
        let config = load_with(CliConfig::default(), r#"{ "cache": { "ttl_secs": 0 } }"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_huge_ttls_rejected() {
        let config = load_with(
            CliConfig::default(),
            r#"{ "cache": { "ttl_secs": 18446744073709551615 } }"#,
        );
        assert!(config.validate().unwrap_err().to_string().contains("cache.ttl_secs"));

        let cli = CliConfig {
            refresh_token_ttl_mins: Some(1 << 50),
            ..Default::default()
        };
        let err = load_with(cli, "{}").validate().unwrap_err().to_string();
        assert!(err.contains("token lifetimes"));

        let cli = CliConfig {
            refresh_token_ttl_mins: Some(MAX_TOKEN_TTL_MINS),
            ..Default::default()
        };
        assert!(load_with(cli, "{}").validate().is_ok());
    }

    #[test]
    fn test_validation_bad_search_url() {
        let config = load_with(CliConfig::default(), r#"{ "search": { "url": "es:9200" } }"#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_secret() {
        let cli = CliConfig {
            jwt_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(load_with(cli, "{}").validate().is_err());
    }

    #[test]
    fn test_yandex_requires_id_and_secret() {
        let cli = CliConfig {
            yandex_client_id: Some("app".into()),
            ..Default::default()
        };
        assert!(load_with(cli.clone(), "{}").yandex.is_none());

        let config = load_with(cli, r#"{ "yandex": { "client_secret": "shh" } }"#);
        let yandex = config.yandex.as_ref().unwrap();
        assert_eq!(yandex.client_id, "app");
        assert_eq!(yandex.token_url, DEFAULT_YANDEX_TOKEN_URL);
        assert!(config.validate().is_ok());
        assert!(!format!("{:?}", yandex).contains("shh"));
    }

    #[test]
    fn test_yandex_bad_url_rejected() {
        let config = load_with(
            CliConfig::default(),
            r#"{ "yandex": { "client_id": "app", "client_secret": "shh", "token_url": "oauth.yandex.ru/token" } }"#,
        );
        assert!(config.validate().unwrap_err().to_string().contains("yandex URLs"));
    }

    #[test]
    fn test_auth_config_debug_hides_secret() {
        let cli = CliConfig {
            jwt_secret: Some("super-secret-value".to_string()),
            ..Default::default()
        };
        let config = load_with(cli, "{}");
        let debug = format!("{:?}", config.auth);
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "server": {{ "port": 9123 }} }}"#).unwrap();
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 9123);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/cinema.json")),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }
}
