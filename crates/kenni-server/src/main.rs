use std::{env, sync::Arc};

use anyhow::Context;
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::Postgres;

use kenni_auth::{AuthState, OidcClient};
use kenni_auth_postgres::PostgresAuthStorage;
use kenni_server::KenniServer;
use kenni_server::config::{DEFAULT_CONFIG_PATH, load_config};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From KENNI_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (kenni.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (KENNI_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; only report files that exist but fail to load
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    kenni_server::observability::init_tracing();

    let (config_path, source) = resolve_config_path();
    let cfg = load_config(Some(&config_path)).context("configuration error")?;
    tracing::info!(
        path = %config_path,
        source = %source,
        environment = ?cfg.environment,
        "Configuration loaded"
    );
    kenni_server::observability::apply_logging_level(&cfg.logging.level);

    let database_url = cfg
        .database
        .url
        .as_deref()
        .context("database.url is required")?;
    let pool = PoolOptions::<Postgres>::new()
        .max_connections(cfg.database.max_connections)
        .acquire_timeout(cfg.database.connect_timeout)
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    let storage = PostgresAuthStorage::new(Arc::new(pool));

    if cfg.database.run_migrations {
        storage.migrate().await.context("database migration failed")?;
    }

    let provider = OidcClient::new(cfg.auth.provider.clone())
        .context("invalid identity provider configuration")?;
    let auth = AuthState::from_config(
        &cfg.auth,
        cfg.secure_cookies(),
        Arc::new(provider),
        storage.user_store(),
        storage.audit_store(),
    )?;

    tracing::info!(
        issuer = %cfg.auth.provider.issuer_url,
        secure_cookies = cfg.secure_cookies(),
        "Kenni login configured"
    );

    KenniServer::new(cfg.addr()?, auth).run().await
}

/// Resolves the config path from `--config`, `KENNI_CONFIG`, or the default.
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config"
            && let Some(path) = args.next()
        {
            return (path, ConfigSource::CliArgument);
        }
    }

    if let Ok(path) = env::var("KENNI_CONFIG")
        && !path.is_empty()
    {
        return (path, ConfigSource::EnvironmentVariable);
    }

    (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default)
}
