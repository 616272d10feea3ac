use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::alerts::thresholds::{AlertThresholds, ThresholdError};
use crate::dispatch::AlertChannel;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("ALERT_THRESHOLDS is invalid: {0}")]
    Thresholds(#[from] ThresholdError),

    #[error("Failed to load portfolio from {path}: {message}")]
    Portfolio { path: String, message: String },
}

/// Credentials and addresses for the messaging backend
#[derive(Debug, Clone, PartialEq)]
pub struct MessagingConfig {
    pub channel: AlertChannel,
    /// Twilio account SID; unused for Telegram
    pub account_id: String,
    /// Twilio auth token or Telegram bot token
    pub auth_token: String,
    /// Sender address, e.g. `whatsapp:+14155238886`
    pub from: String,
    /// Recipient phone number or Telegram chat id
    pub to: String,
}

/// Settings the engine needs on every cycle
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Currency the instruments trade in
    pub fx_from: String,
    /// Currency the portfolio is valued in
    pub fx_to: String,
    /// Rate used when the live FX lookup fails
    pub fx_fallback_rate: Option<f64>,
    pub benchmark_symbol: String,
    pub history_points: usize,
    pub news_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fx_from: "USD".to_string(),
            fx_to: "ILS".to_string(),
            fx_fallback_rate: None,
            benchmark_symbol: "SPY".to_string(),
            history_points: 300,
            news_limit: 20,
        }
    }
}

/// Everything read from the environment at startup
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_rate_limit: u32,
    pub http_timeout_secs: u64,
    pub messaging: MessagingConfig,
    pub portfolio_path: PathBuf,
    pub thresholds: AlertThresholds,
    pub engine: EngineSettings,
    pub check_interval: Duration,
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let channel = match get("ALERT_CHANNEL") {
            Some(value) => value
                .parse::<AlertChannel>()
                .map_err(|message| ConfigError::Invalid { key: "ALERT_CHANNEL", message })?,
            None => AlertChannel::Twilio,
        };

        let messaging = match channel {
            AlertChannel::Twilio => MessagingConfig {
                channel,
                account_id: require("ACCOUNT_SID")?,
                auth_token: require("AUTH_TOKEN")?,
                from: require("TWILIO_NUMBER")?,
                to: require("TO_NUMBER")?,
            },
            AlertChannel::Telegram => MessagingConfig {
                channel,
                account_id: String::new(),
                auth_token: require("TELOXIDE_TOKEN")?,
                from: String::new(),
                to: require("TELEGRAM_CHAT_ID")?,
            },
        };

        let thresholds = match get("ALERT_THRESHOLDS") {
            Some(value) => value.parse::<AlertThresholds>()?,
            None => AlertThresholds::default(),
        };

        let defaults = EngineSettings::default();
        let engine = EngineSettings {
            fx_from: get("FX_FROM").unwrap_or(defaults.fx_from),
            fx_to: get("FX_TO").unwrap_or(defaults.fx_to),
            fx_fallback_rate: parse_optional(&get, "FX_FALLBACK_RATE")?,
            benchmark_symbol: get("BENCHMARK_SYMBOL").unwrap_or(defaults.benchmark_symbol),
            history_points: parse_or(&get, "HISTORY_POINTS", defaults.history_points)?,
            news_limit: parse_or(&get, "NEWS_LIMIT", defaults.news_limit)?,
        };

        let check_secs: u64 = parse_or(&get, "CHECK_INTERVAL_SECS", 3600)?;
        let poll_secs: u64 = parse_or(&get, "POLL_INTERVAL_SECS", 60)?;
        if check_secs == 0 || poll_secs == 0 {
            return Err(ConfigError::Invalid {
                key: if check_secs == 0 { "CHECK_INTERVAL_SECS" } else { "POLL_INTERVAL_SECS" },
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            alpha_vantage_api_key: require("ALPHA_VANTAGE_API_KEY")?,
            alpha_vantage_rate_limit: parse_or(&get, "ALPHA_VANTAGE_RATE_LIMIT", 5)?,
            http_timeout_secs: parse_or(&get, "HTTP_TIMEOUT_SECS", 30)?,
            messaging,
            portfolio_path: get("PORTFOLIO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("portfolio.json")),
            thresholds,
            engine,
            check_interval: Duration::from_secs(check_secs),
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

fn parse_optional<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                message: format!("'{value}': {e}"),
            })
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_optional(get, key)?.unwrap_or(default))
}
