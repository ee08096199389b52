use std::time::Duration;
use tracing::warn;

/// Where the document database lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DbConfig {
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}/{}", self.host, self.port, self.database)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub cache_url: String,
    pub cache_heartbeat: Duration,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 5000;
    const DEFAULT_DB_HOST: &str = "localhost";
    const DEFAULT_DB_PORT: u16 = 27017;
    const DEFAULT_DB_DATABASE: &str = "files_manager";
    const DEFAULT_CACHE_URL: &str = "redis://127.0.0.1:6379/";
    const DEFAULT_CACHE_HEARTBEAT_SECS: u64 = 5;

    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db = DbConfig {
            host: var_or("DB_HOST", Self::DEFAULT_DB_HOST),
            port: parse_or(&lookup, "DB_PORT", Self::DEFAULT_DB_PORT),
            database: var_or("DB_DATABASE", Self::DEFAULT_DB_DATABASE),
        };

        let heartbeat_secs = parse_or(
            &lookup,
            "REDIS_HEARTBEAT_SECS",
            Self::DEFAULT_CACHE_HEARTBEAT_SECS,
        )
        .max(1);

        Self {
            host: var_or("HOST", Self::DEFAULT_HOST),
            port: parse_or(&lookup, "PORT", Self::DEFAULT_PORT),
            db,
            cache_url: var_or("REDIS_URL", Self::DEFAULT_CACHE_URL),
            cache_heartbeat: Duration::from_secs(heartbeat_secs),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{key}={raw:?} is not valid, using default {default}");
            default
        }),
        None => default,
    }
}
