//! Outbound alert delivery.

pub mod telegram;
pub mod twilio;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::config::MessagingConfig;

pub use telegram::TelegramDispatcher;
pub use twilio::TwilioDispatcher;

/// Delivery failure reported by a messaging backend
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rejected by messaging API (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(error: reqwest::Error) -> Self {
        DispatchError::Network(error.to_string())
    }
}

/// Acknowledgement returned by the messaging API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReceipt {
    pub message_id: String,
}

/// Hands a rendered alert to a messaging service
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, body: &str, from: &str, to: &str) -> Result<MessageReceipt, DispatchError>;
}

/// Messaging backend selected by `ALERT_CHANNEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertChannel {
    Twilio,
    Telegram,
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertChannel::Twilio => write!(f, "Twilio"),
            AlertChannel::Telegram => write!(f, "Telegram"),
        }
    }
}

impl FromStr for AlertChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twilio" | "whatsapp" | "sms" => Ok(AlertChannel::Twilio),
            "telegram" => Ok(AlertChannel::Telegram),
            other => Err(format!("Unknown alert channel: {other}")),
        }
    }
}

/// Factory for creating dispatchers from configuration
pub struct DispatcherFactory;

impl DispatcherFactory {
    pub fn create(
        config: &MessagingConfig,
        timeout_secs: u64,
    ) -> Result<Box<dyn AlertDispatcher>, DispatchError> {
        match config.channel {
            AlertChannel::Twilio => Ok(Box::new(TwilioDispatcher::new(
                config.account_id.clone(),
                config.auth_token.clone(),
                timeout_secs,
            )?)),
            AlertChannel::Telegram => Ok(Box::new(TelegramDispatcher::new(&config.auth_token))),
        }
    }
}
