use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Error types for market data operations
#[derive(Debug)]
pub enum StockDataError {
    /// API key is missing or invalid
    InvalidApiKey(String),
    /// Network request failed
    NetworkError(String),
    /// Failed to parse response
    ParseError(String),
    /// Rate limit exceeded
    RateLimitExceeded,
    /// Stock symbol not found
    SymbolNotFound(String),
    /// Provider-specific error
    ProviderError(String),
    /// Configuration error
    ConfigError(String),
}

impl fmt::Display for StockDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockDataError::InvalidApiKey(msg) => write!(f, "Invalid API key: {}", msg),
            StockDataError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            StockDataError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            StockDataError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            StockDataError::SymbolNotFound(symbol) => write!(f, "Symbol not found: {}", symbol),
            StockDataError::ProviderError(msg) => write!(f, "Provider error: {}", msg),
            StockDataError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for StockDataError {}

/// Convert AlphaVantageError to StockDataError
impl From<alpha_vantage::error::Error> for StockDataError {
    fn from(error: alpha_vantage::error::Error) -> Self {
        let error_msg = format!("{:?}", error);

        // The crate only exposes stringly errors, so classify on the message
        if error_msg.contains("Invalid API call") || error_msg.contains("symbol") || error_msg.contains("InvalidData") {
            StockDataError::SymbolNotFound(error_msg)
        } else if error_msg.contains("API key") {
            StockDataError::InvalidApiKey(error_msg)
        } else if error_msg.contains("call frequency") || error_msg.contains("premium") {
            StockDataError::RateLimitExceeded
        } else if error_msg.contains("network") || error_msg.contains("connection") {
            StockDataError::NetworkError(error_msg)
        } else {
            StockDataError::ProviderError(error_msg)
        }
    }
}

impl From<reqwest::Error> for StockDataError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            StockDataError::ParseError(error.to_string())
        } else {
            StockDataError::NetworkError(error.to_string())
        }
    }
}

/// Latest quote for a single instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    /// Stock symbol (e.g., "AAPL")
    pub symbol: String,
    /// Latest close price, in the instrument's trading currency
    pub price: f64,
    /// Price change from previous close
    pub change: f64,
    /// Percentage change from previous close (1.5 means +1.5%)
    pub change_percent: f64,
    /// Previous closing price
    pub previous_close: f64,
    /// When the quote was fetched
    pub timestamp: DateTime<Utc>,
}

/// A news headline returned by the provider's search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockNews {
    pub title: String,
    pub source: String,
    pub url: String,
}

/// Analyst recommendation counts for a symbol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystRatings {
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl AnalystRatings {
    pub fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

/// Configuration for market data providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key for the provider
    pub api_key: String,
    /// Base URL for raw API requests (optional override)
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Rate limit (requests per minute)
    pub rate_limit: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            timeout: 30,
            rate_limit: None,
        }
    }
}

/// Trait for market data providers
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Initialize the provider with configuration
    async fn initialize(&mut self, config: ProviderConfig) -> Result<(), StockDataError>;

    /// Fetch the latest quote for a single symbol
    async fn get_quote(&self, symbol: &str) -> Result<StockQuote, StockDataError>;

    /// Fetch up to `points` daily closes, oldest first
    async fn get_history(&self, symbol: &str, points: usize) -> Result<Vec<f64>, StockDataError>;

    /// Fetch the exchange rate converting one unit of `from` into `to`
    async fn get_fx_rate(&self, from: &str, to: &str) -> Result<f64, StockDataError>;

    /// Search recent news headlines mentioning a symbol
    async fn get_news(&self, symbol: &str, limit: usize) -> Result<Vec<StockNews>, StockDataError>;

    /// Fetch analyst recommendation counts
    async fn get_analyst_ratings(&self, symbol: &str) -> Result<AnalystRatings, StockDataError>;

    /// Check if provider is healthy and accessible
    async fn health_check(&self) -> Result<(), StockDataError> {
        // Default implementation: try to fetch a known symbol
        self.get_quote("AAPL").await.map(|_| ())
    }
}

/// Factory for creating market data providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider by name
    pub fn create(provider_type: &str) -> Result<Box<dyn MarketDataProvider>, StockDataError> {
        match provider_type.to_lowercase().as_str() {
            "alpha_vantage" | "alphavantage" => {
                use crate::stock::alpha_vantage::AlphaVantageProvider;
                Ok(Box::new(AlphaVantageProvider::new()))
            }
            _ => Err(StockDataError::ConfigError(format!(
                "Unknown provider type: {}",
                provider_type
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_default() {
        let config = ProviderConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.base_url.is_none());
        assert!(config.rate_limit.is_none());
    }

    #[test]
    fn test_error_display() {
        let error = StockDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = StockDataError::RateLimitExceeded;
        assert_eq!(format!("{}", error), "Rate limit exceeded");
    }

    #[test]
    fn test_analyst_ratings_total() {
        let ratings = AnalystRatings { strong_buy: 10, buy: 20, hold: 5, sell: 1, strong_sell: 0 };
        assert_eq!(ratings.total(), 36);
        assert_eq!(AnalystRatings::default().total(), 0);
    }

    #[test]
    fn test_provider_factory_create_alpha_vantage() {
        let provider = ProviderFactory::create("alpha_vantage");
        assert!(provider.is_ok());
    }

    #[test]
    fn test_provider_factory_create_unknown() {
        let provider = ProviderFactory::create("unknown");
        assert!(provider.is_err());
    }

    #[test]
    fn test_alpha_vantage_error_conversion() {
        use alpha_vantage::error::Error as AlphaVantageError;

        let alpha_error = AlphaVantageError::AlphaVantageErrorMessage("Invalid API call".to_string());
        let stock_error: StockDataError = alpha_error.into();

        match stock_error {
            StockDataError::SymbolNotFound(_) => {}, // Expected
            _ => panic!("Expected SymbolNotFound error"),
        }
    }
}
