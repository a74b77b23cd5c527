use std::env;

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tos_common::Secret;

const DEFAULT_TOS_HOST: &str = "127.0.0.1";
const DEFAULT_TOS_PORT: u16 = 8380;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/travel_orders.db";
const DEFAULT_TOKEN_TTL: Duration = Duration::hours(1);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TOS_HOST.to_string(),
            port: DEFAULT_TOS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TOS_HOST").ok().unwrap_or_else(|| DEFAULT_TOS_HOST.into());
        let port = env::var("TOS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TOS_PORT. {e} Using the default, {DEFAULT_TOS_PORT}, instead."
                    );
                    DEFAULT_TOS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TOS_PORT);
        let database_url = env::var("TOS_DATABASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ TOS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::from_env_or_default();
        Self { host, port, database_url, auth }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Secret used to sign and verify access tokens (HS256). Must be set in production via
    /// `TOS_JWT_SECRET`.
    pub jwt_secret: Secret<String>,
    /// Lifetime of issued access tokens.
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: Secret::new(random_secret()), token_ttl: DEFAULT_TOKEN_TTL }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_secret = match env::var("TOS_JWT_SECRET") {
            Ok(secret) if secret.len() >= 32 => Secret::new(secret),
            Ok(_) => {
                warn!(
                    "🪛️ TOS_JWT_SECRET is too short (need at least 32 characters). Generating a random secret. \
                     Tokens will not survive a restart."
                );
                Secret::new(random_secret())
            },
            Err(_) => {
                warn!(
                    "🪛️ TOS_JWT_SECRET is not set. Generating a random secret. Tokens will not survive a restart."
                );
                Secret::new(random_secret())
            },
        };
        let token_ttl = env::var("TOS_JWT_TTL_SECONDS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for TOS_JWT_TTL_SECONDS. {e}");
                        e
                    })
                    .ok()
            })
            .map(Duration::seconds)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        Self { jwt_secret, token_ttl }
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect()
}
