//! Database connection settings.
//!
//! Settings are loaded from environment variables with fallback to defaults.
//! Loading goes through a lookup function so tests can supply a map instead
//! of mutating the process environment.
//!
//! | Variable                    | Default     |
//! |-----------------------------|-------------|
//! | `DATABASE_URL`              | (unset)     |
//! | `DB_HOST`                   | `localhost` |
//! | `DB_PORT`                   | `5432`      |
//! | `DB_USER`                   | `postgres`  |
//! | `DB_PASSWORD`               | `postgres`  |
//! | `DB_NAME`                   | `roster`    |
//! | `DB_SSLMODE`                | `disable`   |
//! | `DB_MAX_CONNS`              | `10`        |
//! | `DB_MIN_CONNS`              | `2`         |
//! | `DB_MAX_CONN_LIFETIME_SECS` | `3600`      |
//! | `DB_MAX_CONN_IDLE_SECS`     | `1800`      |
//! | `DB_HEALTH_CHECK_SECS`      | `60`        |
//! | `DB_CONNECT_TIMEOUT_SECS`   | `5`         |
//! | `DB_CONNECT_RETRIES`        | `5`         |
//! | `DB_RETRY_DELAY_MS`         | `3000`      |
//!
//! When `DATABASE_URL` is set it wins over the individual `DB_HOST` ...
//! `DB_SSLMODE` fields.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::pool::PoolConfig;

/// Where and how to connect.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,

    #[serde(skip_serializing)]
    pub password: String,

    pub database: String,

    /// libpq-style SSL mode (`disable`, `prefer`, `require`, `verify-full`, ...).
    pub ssl_mode: String,

    /// Full connection URL; overrides the individual fields when present.
    #[serde(skip_serializing)]
    pub url: Option<String>,

    pub pool: PoolConfig,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "roster".to_string(),
            ssl_mode: "disable".to_string(),
            url: None,
            pool: PoolConfig::default(),
        }
    }
}

// Hand-written so credentials never reach the logs.
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("url", &self.url.as_ref().map(|_| "***"))
            .field("pool", &self.pool)
            .finish()
    }
}

impl DatabaseSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DatabaseSettings::default();
        let pool_defaults = PoolConfig::default();

        let ssl_mode = lookup("DB_SSLMODE").unwrap_or(defaults.ssl_mode);
        PgSslMode::from_str(&ssl_mode)
            .map_err(|_| ConfigError::InvalidValue("DB_SSLMODE".to_string()))?;

        let pool = PoolConfig {
            max_connections: parse_or(&lookup, "DB_MAX_CONNS", pool_defaults.max_connections)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNS", pool_defaults.min_connections)?,
            max_lifetime: secs_or(&lookup, "DB_MAX_CONN_LIFETIME_SECS", pool_defaults.max_lifetime)?,
            max_idle_time: secs_or(&lookup, "DB_MAX_CONN_IDLE_SECS", pool_defaults.max_idle_time)?,
            health_check_interval: secs_or(
                &lookup,
                "DB_HEALTH_CHECK_SECS",
                pool_defaults.health_check_interval,
            )?,
            connect_timeout: secs_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECS",
                pool_defaults.connect_timeout,
            )?,
            max_retries: parse_or(&lookup, "DB_CONNECT_RETRIES", pool_defaults.max_retries)?,
            initial_retry_delay: Duration::from_millis(parse_or(
                &lookup,
                "DB_RETRY_DELAY_MS",
                pool_defaults.initial_retry_delay.as_millis() as u64,
            )?),
        };

        if pool.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNS".to_string()));
        }
        if pool.min_connections > pool.max_connections {
            return Err(ConfigError::InvalidValue("DB_MIN_CONNS".to_string()));
        }

        Ok(DatabaseSettings {
            host: lookup("DB_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "DB_PORT", defaults.port)?,
            user: lookup("DB_USER").unwrap_or(defaults.user),
            password: lookup("DB_PASSWORD").unwrap_or(defaults.password),
            database: lookup("DB_NAME").unwrap_or(defaults.database),
            ssl_mode,
            url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            pool,
        })
    }

    /// Builds driver connect options from these settings.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url)
                .map_err(|_| ConfigError::InvalidValue("DATABASE_URL".to_string()));
        }

        let ssl_mode = PgSslMode::from_str(&self.ssl_mode)
            .map_err(|_| ConfigError::InvalidValue("DB_SSLMODE".to_string()))?;

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(ssl_mode))
    }

    /// Connection target without credentials, for log lines.
    pub fn target(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = DatabaseSettings::from_lookup(|_| None).unwrap();

        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 5432);
        assert_eq!(settings.database, "roster");
        assert_eq!(settings.ssl_mode, "disable");
        assert!(settings.url.is_none());
        assert_eq!(settings.pool.max_connections, 10);
        assert_eq!(settings.pool.min_connections, 2);
        assert_eq!(settings.pool.initial_retry_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_overrides_are_applied() {
        let settings = DatabaseSettings::from_lookup(lookup_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_MAX_CONNS", "25"),
            ("DB_CONNECT_RETRIES", "0"),
            ("DB_RETRY_DELAY_MS", "250"),
            ("DB_SSLMODE", "require"),
        ]))
        .unwrap();

        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.port, 6543);
        assert_eq!(settings.pool.max_connections, 25);
        assert_eq!(settings.pool.max_retries, 0);
        assert_eq!(settings.pool.initial_retry_delay, Duration::from_millis(250));
        assert_eq!(settings.target(), "db.internal:6543/roster");
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = DatabaseSettings::from_lookup(lookup_from(&[("DB_PORT", "not-a-port")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for DB_PORT");
    }

    #[test]
    fn test_invalid_ssl_mode_is_rejected() {
        assert!(DatabaseSettings::from_lookup(lookup_from(&[("DB_SSLMODE", "sometimes")])).is_err());
    }

    #[test]
    fn test_min_above_max_is_rejected() {
        let err = DatabaseSettings::from_lookup(lookup_from(&[
            ("DB_MAX_CONNS", "2"),
            ("DB_MIN_CONNS", "5"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for DB_MIN_CONNS");
    }

    #[test]
    fn test_url_wins_and_is_redacted() {
        let settings = DatabaseSettings::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://app:s3cret@db:5432/roster",
        )]))
        .unwrap();

        assert!(settings.connect_options().is_ok());
        assert_eq!(settings.target(), "DATABASE_URL");
        assert!(!format!("{settings:?}").contains("s3cret"));
    }
}
