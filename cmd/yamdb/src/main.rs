//! # yamdb
//!
//! The entry point that assembles the server from the adapters enabled at
//! compile time.

#[cfg(not(all(feature = "web-axum", feature = "auth-jwt")))]
compile_error!("the yamdb binary needs the `web-axum` and `auth-jwt` features");

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, AuthPorts};
use auth_adapters::{Argon2SecretHasher, JwtTokenService, LogMailer, UuidCodeGenerator};
use configs::{AppConfig, LogConfig};
use domains::{CatalogRepo, ReviewRepo, UserRepo};
use secrecy::ExposeSecret;
use storage_adapters::MemoryStore;
use tracing_subscriber::EnvFilter;

struct Stores {
    users: Arc<dyn UserRepo>,
    catalog: Arc<dyn CatalogRepo>,
    reviews: Arc<dyn ReviewRepo>,
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[cfg(feature = "db-postgres")]
async fn open_postgres(config: &AppConfig) -> anyhow::Result<Option<Stores>> {
    let Some(url) = &config.database.url else {
        return Ok(None);
    };
    let store = storage_adapters::PgStore::connect(
        url.expose_secret(),
        config.database.max_connections,
    )
    .await
    .context("failed to connect to postgres")?;
    store.migrate().await?;

    let store = Arc::new(store);
    tracing::info!(max_connections = config.database.max_connections, "using postgres store");
    Ok(Some(Stores {
        users: store.clone(),
        catalog: store.clone(),
        reviews: store,
    }))
}

#[cfg(not(feature = "db-postgres"))]
async fn open_postgres(config: &AppConfig) -> anyhow::Result<Option<Stores>> {
    if config.database.url.is_some() {
        tracing::warn!("database.url is set but the db-postgres feature is disabled");
    }
    Ok(None)
}

async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    if let Some(stores) = open_postgres(config).await? {
        return Ok(stores);
    }
    tracing::warn!("no database configured, data lives in memory only");
    let store = Arc::new(MemoryStore::new());
    Ok(Stores {
        users: store.clone(),
        catalog: store.clone(),
        reviews: store,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration and logging
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    // 2. Persistence
    let stores = open_stores(&config).await?;

    // 3. Accounts: codes, hashing, tokens, mail
    let auth = AuthPorts {
        codes: Arc::new(UuidCodeGenerator),
        hasher: Arc::new(Argon2SecretHasher::new()),
        tokens: Arc::new(JwtTokenService::new(
            config.auth.jwt_secret.expose_secret(),
            chrono::Duration::minutes(config.auth.token_ttl_minutes),
        )),
        mailer: Arc::new(LogMailer::new(config.mail.from_address.clone())),
    };

    // 4. Wire services and serve
    let state = AppState::new(stores.users, stores.catalog, stores.reviews, auth);
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr()))?;
    tracing::info!(addr = %listener.local_addr()?, "yamdb listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
