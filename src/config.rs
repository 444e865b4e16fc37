// Runtime configuration loaded from the environment (and an optional .env file)

use std::ops::RangeInclusive;
use std::str::FromStr;

/// Issuer embedded in, and required of, every token
pub const TOKEN_ISSUER: &str = "blog-system";

pub(crate) const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24 * 7;
const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;
const DEFAULT_JWT_CLOCK_SKEW_SECS: i64 = 30;
const MAX_JWT_CLOCK_SKEW_SECS: i64 = 300;
const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Server, database and token settings
///
/// Loaded once at startup; the signing secret it carries is handed to the
/// token service and never changes for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub clock_skew_secs: i64,
}

impl Config {
    /// Build the configuration from environment variables
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required, everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                "JWT_SECRET is shorter than {} bytes; use a longer secret in production",
                MIN_RECOMMENDED_SECRET_LEN
            );
        }

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 8080)?,
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
                acquire_timeout_secs: parsed("DB_ACQUIRE_TIMEOUT_SECS", 3)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours: bounded(
                    "JWT_EXPIRATION_HOURS",
                    DEFAULT_JWT_EXPIRATION_HOURS,
                    1..=MAX_JWT_EXPIRATION_HOURS,
                )?,
                clock_skew_secs: bounded(
                    "JWT_CLOCK_SKEW_SECS",
                    DEFAULT_JWT_CLOCK_SKEW_SECS,
                    0..=MAX_JWT_CLOCK_SKEW_SECS,
                )?,
            },
        })
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            clock_skew_secs: DEFAULT_JWT_CLOCK_SKEW_SECS,
        }
    }
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Like `parsed`, but the value must also fall inside `range`
fn bounded(name: &'static str, default: i64, range: RangeInclusive<i64>) -> Result<i64, ConfigError> {
    let value = parsed(name, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}
