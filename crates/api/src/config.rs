//! Application configuration loaded from environment variables.

use chrono::NaiveDate;
use chrono_tz::Tz;
use reports::BusinessCalendar;
use thiserror::Error;

/// A configuration variable held a value that could not be used.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8080`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string; unset means in-memory store
/// - `DB_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `BUSINESS_TIMEZONE`: IANA zone for business days (default: `"Asia/Jakarta"`)
/// - `BUSINESS_EPOCH`: default report start date (default: `"2026-01-01"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub business_timezone: Tz,
    pub business_epoch: NaiveDate,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", non_empty("PORT"), defaults.port)?,
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: parse_var(
                "DB_MAX_CONNECTIONS",
                non_empty("DB_MAX_CONNECTIONS"),
                defaults.db_max_connections,
            )?,
            business_timezone: parse_var(
                "BUSINESS_TIMEZONE",
                non_empty("BUSINESS_TIMEZONE"),
                defaults.business_timezone,
            )?,
            business_epoch: parse_var(
                "BUSINESS_EPOCH",
                non_empty("BUSINESS_EPOCH"),
                defaults.business_epoch,
            )?,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the business calendar reports are computed in.
    pub fn calendar(&self) -> BusinessCalendar {
        BusinessCalendar::new(self.business_timezone, self.business_epoch)
    }
}

impl Default for Config {
    fn default() -> Self {
        let calendar = BusinessCalendar::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            database_url: None,
            db_max_connections: 10,
            business_timezone: calendar.timezone(),
            business_epoch: calendar.epoch(),
        }
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = value else {
        return Ok(default);
    };

    let parsed: Result<T, T::Err> = value.trim().parse();
    parsed.map_err(|e| ConfigError {
        var,
        reason: e.to_string(),
        value,
    })
}
