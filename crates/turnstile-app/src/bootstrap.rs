use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use turnstile_api::ApiServer;
use turnstile_auth::{MemoryDirectory, SessionManager, UserDirectory};
use turnstile_config::ServiceConfig;
use turnstile_data::{PgTodoStore, PgUserDirectory};
use turnstile_outbound::OutboundService;
use turnstile_telemetry::{LoggingConfig, Metrics};
use turnstile_todo::{MemoryTodoStore, TodoService, TodoStore};

use crate::error::{AppError, AppResult};

const BUILD_SHA: &str = match option_env!("TURNSTILE_BUILD_SHA") {
    Some(sha) => sha,
    None => env!("CARGO_PKG_VERSION"),
};

/// Dependencies required to bootstrap the service.
pub(crate) struct BootstrapDependencies {
    config: ServiceConfig,
    telemetry: Metrics,
    dotenv: Option<PathBuf>,
}

impl BootstrapDependencies {
    /// Construct production dependencies from `.env` and the process environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let dotenv = load_dotenv()?;
        let config =
            ServiceConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            telemetry,
            dotenv,
        })
    }
}

/// Backends selected for credentials and todos.
pub(crate) struct Stores {
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) todos: Arc<dyn TodoStore>,
}

impl Stores {
    fn memory() -> Self {
        Self {
            directory: Arc::new(MemoryDirectory::new()),
            todos: Arc::new(MemoryTodoStore::new()),
        }
    }
}

/// Entry point for the Turnstile boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, the database, or the listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies {
        config,
        telemetry,
        dotenv,
    } = dependencies;

    turnstile_telemetry::init_logging(&LoggingConfig {
        level: &config.log_level,
        format: config.log_format,
        build_sha: BUILD_SHA,
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!(config = ?config, "Turnstile bootstrap starting");
    if let Some(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let stores = select_stores(&config).await?;
    let hasher = config
        .hasher()
        .map_err(|err| AppError::config("config.hasher", err))?;
    let sessions = SessionManager::new(config.session_config(), stores.directory, Arc::new(hasher));
    let todos = TodoService::new(stores.todos);

    let outbound = OutboundService::in_memory();
    let api = ApiServer::new(Arc::new(sessions), todos, outbound, telemetry);
    info!(addr = %config.bind_addr, "Launching API listener");
    api.serve(config.bind_addr, shutdown_signal())
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;

    info!("API server shutdown complete");
    Ok(())
}

/// PostgreSQL when a database URL is configured, in-memory otherwise.
pub(crate) async fn select_stores(config: &ServiceConfig) -> AppResult<Stores> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set; state is kept in memory and lost on restart");
        return Ok(Stores::memory());
    };

    let pool = turnstile_data::connect(url)
        .await
        .map_err(|err| AppError::data("data.connect", err))?;
    info!("PostgreSQL stores ready");
    Ok(Stores {
        directory: Arc::new(PgUserDirectory::new(pool.clone())),
        todos: Arc::new(PgTodoStore::new(pool)),
    })
}

fn load_dotenv() -> AppResult<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(source) => Err(AppError::Dotenv { source }),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install shutdown signal handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use turnstile_auth::{NewCredential, Role};
    use turnstile_config::env;

    fn config() -> anyhow::Result<ServiceConfig> {
        Ok(ServiceConfig::from_lookup(|name| match name {
            env::SECRET_KEY => Some("k3y-for-access".into()),
            env::REFRESH_SECRET => Some("k3y-for-refresh".into()),
            _ => None,
        })?)
    }

    #[tokio::test]
    async fn memory_stores_are_selected_without_database() -> anyhow::Result<()> {
        let config = config()?;
        assert!(!config.uses_database());

        let stores = select_stores(&config).await?;
        let record = stores
            .directory
            .insert(NewCredential {
                identity: "alice".into(),
                email: "a@x.com".into(),
                password_hash: "$argon2id$stub".into(),
                role: Role::User,
                created_at: Utc::now(),
            })
            .await?;
        assert_eq!(record.identity, "alice");
        assert!(stores.directory.find_by_email("a@x.com").await?.is_some());
        Ok(())
    }

    #[test]
    fn sessions_build_from_config() -> anyhow::Result<()> {
        let config = config()?;
        let stores = Stores::memory();
        let hasher = config.hasher()?;
        let manager =
            SessionManager::new(config.session_config(), stores.directory, Arc::new(hasher));
        assert!(manager.verify_access("").is_err());
        Ok(())
    }
}
