use std::path::PathBuf;
use std::time::Duration;

use ipledger_core::application_number::validate_country;

/// Startup configuration errors. Any of these aborts the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid ('{value}'): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Ledger configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
    /// Two-letter prefix of every issued application number (default: `CN`).
    pub country_code: String,
    /// Directory the local attachment store is rooted at.
    pub attachment_root: PathBuf,
    /// Upper bound on one technical-domain scan (default: 5 seconds).
    pub tech_scan_timeout: Duration,
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                  | Default          |
    /// |--------------------------|------------------|
    /// | `DATABASE_URL`           | (required)       |
    /// | `DB_MAX_CONNECTIONS`     | `20`             |
    /// | `COUNTRY_CODE`           | `CN`             |
    /// | `ATTACHMENT_ROOT`        | `./attachments`  |
    /// | `TECH_SCAN_TIMEOUT_SECS` | `5`              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections: u32 = parse_var(&lookup, "DB_MAX_CONNECTIONS", "20")?;
        if max_connections == 0 {
            return Err(invalid("DB_MAX_CONNECTIONS", "0", "must be at least 1"));
        }

        let country_code = lookup("COUNTRY_CODE").unwrap_or_else(|| "CN".into());
        validate_country(&country_code)
            .map_err(|e| invalid("COUNTRY_CODE", &country_code, &e.to_string()))?;

        let attachment_root =
            PathBuf::from(lookup("ATTACHMENT_ROOT").unwrap_or_else(|| "./attachments".into()));

        let tech_scan_secs: u64 = parse_var(&lookup, "TECH_SCAN_TIMEOUT_SECS", "5")?;
        if tech_scan_secs == 0 {
            return Err(invalid("TECH_SCAN_TIMEOUT_SECS", "0", "must be at least 1"));
        }

        Ok(Self {
            database_url,
            max_connections,
            country_code,
            attachment_root,
            tech_scan_timeout: Duration::from_secs(tech_scan_secs),
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = lookup(var).unwrap_or_else(|| default.into());
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(var, &value, &e.to_string()))
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
