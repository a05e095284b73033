//! Environment configuration for a conversion run.
//!
//! Every setting has a default, so an empty environment yields a working
//! configuration against a local database.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use billtext_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for one `convert_attachment_text` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    pub database_url: String,
    /// `table` or `schema.table`.
    pub table: String,
    pub time_zone: String,
    pub batch_size: usize,
    pub recent_limit: i64,
    /// `None` uses a per-run temporary directory.
    pub scratch_dir: Option<PathBuf>,
    /// `None` means requests never time out.
    pub fetch_timeout: Option<Duration>,
    pub extraction_timeout: Duration,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            table: defaults::ATTACHMENT_TABLE.to_string(),
            time_zone: defaults::TIME_ZONE.to_string(),
            batch_size: defaults::BATCH_SIZE,
            recent_limit: defaults::RECENT_LIMIT,
            scratch_dir: None,
            fetch_timeout: None,
            extraction_timeout: Duration::from_secs(defaults::EXTRACTION_CMD_TIMEOUT_SECS),
        }
    }
}

impl ConversionConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let base = Self::default();

        let config = Self {
            database_url: get(defaults::ENV_DATABASE_URL).unwrap_or(base.database_url),
            table: get(defaults::ENV_TABLE).unwrap_or(base.table),
            time_zone: get(defaults::ENV_TIME_ZONE).unwrap_or(base.time_zone),
            batch_size: parse_var(defaults::ENV_BATCH_SIZE, get(defaults::ENV_BATCH_SIZE))?
                .unwrap_or(base.batch_size),
            recent_limit: parse_var(defaults::ENV_RECENT_LIMIT, get(defaults::ENV_RECENT_LIMIT))?
                .unwrap_or(base.recent_limit),
            scratch_dir: get(defaults::ENV_SCRATCH_DIR).map(PathBuf::from),
            fetch_timeout: parse_var::<u64>(
                defaults::ENV_FETCH_TIMEOUT_SECS,
                get(defaults::ENV_FETCH_TIMEOUT_SECS),
            )?
            .map(Duration::from_secs),
            extraction_timeout: parse_var::<u64>(
                defaults::ENV_EXTRACTION_TIMEOUT_SECS,
                get(defaults::ENV_EXTRACTION_TIMEOUT_SECS),
            )?
            .map(Duration::from_secs)
            .unwrap_or(base.extraction_timeout),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_url.is_empty() {
            return Err(ConfigError::Validation(
                "database URL cannot be empty".to_string(),
            ));
        }
        if self.table.is_empty() {
            return Err(ConfigError::Validation(
                "table name cannot be empty".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "batch size must be greater than zero".to_string(),
            ));
        }
        if self.recent_limit <= 0 {
            return Err(ConfigError::Validation(
                "recent limit must be greater than zero".to_string(),
            ));
        }
        if self.extraction_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "extraction timeout must be greater than zero".to_string(),
            ));
        }
        if self.fetch_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Validation(
                "fetch timeout must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    var,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}
