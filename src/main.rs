//! Storefront - shop backend with WhatsApp checkout

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::{
    api::{self, AppState},
    auth::{password, AuthKeys},
    domain::events::EventPublisher,
    repo::{MemoryRepository, PgRepository, Repository},
    Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("hash-password") => return hash_password(args.next()),
        Some(other) => anyhow::bail!("unknown command {other:?}; usage: storefront [hash-password [PASSWORD]]"),
        None => {}
    }

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let repo: Arc<dyn Repository> = match &config.database_url {
        Some(url) => Arc::new(PgRepository::connect(url, config.database_max_connections).await.context("connecting to Postgres")?),
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory repository; data is lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events will only be logged");
                None
            }
        },
        None => None,
    };

    let auth = AuthKeys::new(&config.admin, &config.identity)?;
    if config.admin.password_hash.is_none() {
        tracing::warn!("ADMIN_PASSWORD_HASH not set, admin login is disabled");
    }
    if !auth.customer_accounts_enabled() {
        tracing::info!("no identity provider configured, customer accounts are disabled");
    }

    let port = config.port;
    let state = AppState { repo, auth: Arc::new(auth), events: EventPublisher::new(nats) };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Storefront listening on 0.0.0.0:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Prints a value for ADMIN_PASSWORD_HASH. Reads the password from stdin when not given.
fn hash_password(arg: Option<String>) -> Result<()> {
    let plain = match arg {
        Some(p) => p,
        None => {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line.trim_end_matches(&['\r', '\n'][..]).to_string()
        }
    };
    if plain.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    let hash = password::hash_password(&plain).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
    println!("{hash}");
    Ok(())
}
