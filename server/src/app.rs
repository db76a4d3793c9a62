//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::api::auth::TokenManager;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, DEFAULT_LOG_FILTER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::cache::{CacheService, RateLimiter};
use crate::data::oauth::{SocialProvider, YandexOAuth};
use crate::data::search::{self, DocumentStore};
use crate::data::PostgresService;
use crate::domain::access::bootstrap_admin;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub cache: Arc<CacheService>,
    pub store: Arc<dyn DocumentStore>,
    /// Absent when no PostgreSQL URL is configured
    pub postgres: Option<Arc<PostgresService>>,
    pub tokens: Arc<TokenManager>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Absent when Yandex credentials are not configured
    pub social: Option<Arc<dyn SocialProvider>>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Migrate) => Self::migrate(&cli_config).await,
            Some(Commands::CreateAdmin {
                login,
                password,
                first_name,
                last_name,
            }) => Self::create_admin(&cli_config, &login, &password, &first_name, &last_name).await,
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let cache = Arc::new(
            CacheService::new(&config.cache)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize cache service: {}", e))?,
        );
        tracing::debug!(backend = cache.backend_name(), "Cache initialized");

        let rate_limiter = Arc::new(RateLimiter::new(cache.clone()));

        let store = search::create_store(&config.search)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize document store: {}", e))?;
        tracing::debug!(backend = store.backend_name(), "Document store initialized");

        let postgres = match config.postgres {
            Some(ref pg) => Some(Arc::new(
                PostgresService::init(pg)
                    .await
                    .context("Failed to initialize PostgreSQL")?,
            )),
            None => None,
        };

        let tokens = Arc::new(TokenManager::from_config(&config.auth));
        let shutdown = ShutdownService::new(postgres.clone());

        let social: Option<Arc<dyn SocialProvider>> = match config.yandex {
            Some(ref yandex) => Some(Arc::new(
                YandexOAuth::new(yandex).context("Failed to initialize Yandex OAuth")?,
            )),
            None => None,
        };

        Ok(Self {
            shutdown,
            config,
            cache,
            store,
            postgres,
            tokens,
            rate_limiter,
            social,
        })
    }

    /// Apply the schema and exit
    async fn migrate(cli: &CliConfig) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let pg = config
            .postgres
            .as_ref()
            .context("PostgreSQL URL is required for migrations")?;

        let postgres = PostgresService::connect(pg)
            .await
            .context("Failed to connect to PostgreSQL")?;
        postgres.migrate().await.context("Migration failed")?;
        postgres.close().await;

        tracing::info!("Migrations applied");
        Ok(())
    }

    async fn create_admin(
        cli: &CliConfig,
        login: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let pg = config
            .postgres
            .as_ref()
            .context("PostgreSQL URL is required to create an administrator")?;

        let postgres = PostgresService::init(pg)
            .await
            .context("Failed to initialize PostgreSQL")?;
        let result = bootstrap_admin(&postgres, login, password, first_name, last_name).await;
        postgres.close().await;

        let user = result.context("Failed to create administrator")?;
        tracing::info!(user_id = %user.id, login = %user.login, "Administrator ready");
        Ok(())
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        if let Some(ref postgres) = app.postgres {
            app.shutdown
                .register(postgres.start_health_check_task(app.shutdown.subscribe()))
                .await;
        }

        tracing::info!(
            host = %app.config.server.host,
            port = app.config.server.port,
            cache = app.cache.backend_name(),
            search = app.store.backend_name(),
            auth = app.postgres.is_some(),
            social = app.social.is_some(),
            version = env!("CARGO_PKG_VERSION"),
            "{} starting",
            APP_NAME
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
