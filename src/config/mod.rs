use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::retry::{Backoff, RetryPolicy};
use crate::tiingo::client::{DEFAULT_PAIR, TIINGO_API_BASE};

const DEFAULT_SPREADSHEET_PATH: &str = "stocks-v2.json";
const DEFAULT_UPDATE_BATCH_DELAY_MS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // NocoDB
    pub nocodb_base_url: String,
    pub nocodb_api_token: String,
    /// Only the migration needs it (table metadata endpoints).
    pub nocodb_base_id: Option<String>,
    pub options_table_id: Option<String>,
    pub deposits_table_id: Option<String>,

    // Tiingo
    pub tiingo_api_token: Option<String>,
    pub tiingo_base_url: String,
    pub rate_pair: String,

    // Runs
    pub spreadsheet_path: PathBuf,
    pub update_batch_delay: Duration,
    pub http_timeout: Option<Duration>,
    pub store_retry: RetryPolicy,
    pub rate_retry: RetryPolicy,
    pub apply: bool,
    pub clean: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let store_default = RetryPolicy::default();
        let rate_default = RetryPolicy::rate_provider();

        Ok(Self {
            nocodb_base_url: required("NOCODB_BASE_URL")?,
            nocodb_api_token: required("NOCODB_API_TOKEN")?,
            nocodb_base_id: get("NOCODB_BASE_ID"),
            options_table_id: get("NOCODB_TABLE_OPTIONS"),
            deposits_table_id: get("NOCODB_TABLE_DEPOSITS"),

            tiingo_api_token: get("TIINGO_API_TOKEN"),
            tiingo_base_url: get("TIINGO_BASE_URL").unwrap_or_else(|| TIINGO_API_BASE.into()),
            rate_pair: get("RATE_PAIR").unwrap_or_else(|| DEFAULT_PAIR.into()),

            spreadsheet_path: get("SPREADSHEET_PATH")
                .unwrap_or_else(|| DEFAULT_SPREADSHEET_PATH.into())
                .into(),
            update_batch_delay: Duration::from_millis(parse_or(
                "UPDATE_BATCH_DELAY_MS",
                get("UPDATE_BATCH_DELAY_MS"),
                DEFAULT_UPDATE_BATCH_DELAY_MS,
            )?),
            http_timeout: get("HTTP_TIMEOUT_SECS")
                .map(|v| parse("HTTP_TIMEOUT_SECS", v).map(Duration::from_secs))
                .transpose()?,
            store_retry: retry_from(
                store_default,
                ("STORE_RETRY_MAX_ATTEMPTS", get("STORE_RETRY_MAX_ATTEMPTS")),
                ("STORE_RETRY_BACKOFF_SECS", get("STORE_RETRY_BACKOFF_SECS")),
            )?,
            rate_retry: retry_from(
                rate_default,
                ("RATE_RETRY_MAX_ATTEMPTS", get("RATE_RETRY_MAX_ATTEMPTS")),
                ("RATE_RETRY_BACKOFF_SECS", get("RATE_RETRY_BACKOFF_SECS")),
            )?,
            apply: flag("APPLY", get("APPLY"))?,
            clean: flag("CLEAN", get("CLEAN"))?,
        })
    }

    pub fn require_base_id(&self) -> Result<&str, ConfigError> {
        self.nocodb_base_id
            .as_deref()
            .ok_or(ConfigError::Missing("NOCODB_BASE_ID"))
    }

    pub fn require_options_table(&self) -> Result<&str, ConfigError> {
        self.options_table_id
            .as_deref()
            .ok_or(ConfigError::Missing("NOCODB_TABLE_OPTIONS"))
    }

    pub fn require_deposits_table(&self) -> Result<&str, ConfigError> {
        self.deposits_table_id
            .as_deref()
            .ok_or(ConfigError::Missing("NOCODB_TABLE_DEPOSITS"))
    }

    pub fn require_tiingo_token(&self) -> Result<&str, ConfigError> {
        self.tiingo_api_token
            .as_deref()
            .ok_or(ConfigError::Missing("TIINGO_API_TOKEN"))
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_or<T: std::str::FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    value.map_or(Ok(default), |v| parse(name, v))
}

fn flag(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(false);
    };
    match raw.to_lowercase().as_str() {
        "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}

/// Override attempts and the linear backoff step of a default policy.
fn retry_from(
    mut policy: RetryPolicy,
    (attempts_key, attempts): (&'static str, Option<String>),
    (backoff_key, backoff): (&'static str, Option<String>),
) -> Result<RetryPolicy, ConfigError> {
    if let Some(raw) = attempts {
        let n: u32 = parse(attempts_key, raw.clone())?;
        if n == 0 {
            return Err(ConfigError::Invalid {
                name: attempts_key,
                value: raw,
            });
        }
        policy.max_attempts = n;
    }
    if let Some(raw) = backoff {
        let secs: u64 = parse(backoff_key, raw)?;
        policy.backoff = if secs == 0 {
            Backoff::None
        } else {
            Backoff::Linear(Duration::from_secs(secs))
        };
    }
    Ok(policy)
}
