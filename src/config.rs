//! Environment configuration
//!
//! `main` loads `.env` through `dotenvy` first, so every value can live in either place.

use std::fmt;
use thiserror::Error;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// No URL means the in-memory repository.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub admin: AdminConfig,
    pub identity: IdentityConfig,
}

#[derive(Clone, Default)]
pub struct AdminConfig {
    pub email: Option<String>,
    /// argon2 PHC string, see `storefront hash-password`.
    pub password_hash: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone, Default)]
pub struct IdentityConfig {
    pub jwt_secret: Option<String>,
    pub public_key_pem: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid { name: &'static str, expected: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let admin = AdminConfig {
            email: get("ADMIN_EMAIL"),
            password_hash: get("ADMIN_PASSWORD_HASH"),
            jwt_secret: get("ADMIN_JWT_SECRET").unwrap_or_else(|| {
                tracing::warn!("ADMIN_JWT_SECRET not set, using a random secret; admin tokens will not survive restarts");
                random_secret()
            }),
            token_ttl_hours: parse(get("ADMIN_TOKEN_TTL_HOURS"), "ADMIN_TOKEN_TTL_HOURS", "a positive number of hours", 12)?,
        };
        if admin.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid { name: "ADMIN_TOKEN_TTL_HOURS", expected: "a positive number of hours", value: admin.token_ttl_hours.to_string() });
        }

        Ok(Self {
            port: parse(get("PORT"), "PORT", "a TCP port", 8083)?,
            database_url: get("DATABASE_URL"),
            database_max_connections: parse(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", "a positive integer", 10)?,
            nats_url: get("NATS_URL"),
            admin,
            identity: IdentityConfig {
                jwt_secret: get("IDP_JWT_SECRET"),
                public_key_pem: get("IDP_PUBLIC_KEY_PEM").map(|pem| pem.replace("\\n", "\n")),
                issuer: get("IDP_ISSUER"),
                audience: get("IDP_AUDIENCE"),
            },
        })
    }
}

fn parse<T: std::str::FromStr>(raw: Option<String>, name: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, expected, value }),
    }
}

fn random_secret() -> String {
    (0..48).map(|_| format!("{:02x}", rand::random::<u8>())).collect()
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("nats_url", &self.nats_url)
            .field("admin_email", &self.admin.email)
            .field("identity_issuer", &self.identity.issuer)
            .finish()
    }
}
