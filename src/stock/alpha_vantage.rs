//! Alpha Vantage market data provider.
//!
//! Quotes go through the `alpha_vantage` crate. Daily history, FX rates,
//! news headlines and company overviews are not covered by the crate, so
//! those hit the query endpoint directly with `reqwest`.

use super::provider::{
    AnalystRatings, MarketDataProvider, ProviderConfig, StockDataError, StockNews, StockQuote,
};
use alpha_vantage::api::ApiClient;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
/// Alpha Vantage returns at most this many points for `outputsize=compact`
const COMPACT_POINTS: usize = 100;

/// Rate limiting state for Alpha Vantage API
#[derive(Debug)]
struct RateLimitState {
    requests_made: u32,
    window_start: Instant,
    requests_per_minute: u32,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            requests_made: 0,
            window_start: Instant::now(),
            requests_per_minute: 5, // Alpha Vantage free tier: 5 requests per minute
        }
    }
}

impl RateLimitState {
    /// Claim a request slot, or return how long to wait for the next window
    fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        let window = Duration::from_secs(60);
        if now.duration_since(self.window_start) >= window {
            self.requests_made = 0;
            self.window_start = now;
        }

        if self.requests_made >= self.requests_per_minute {
            return Err(window.saturating_sub(now.duration_since(self.window_start)));
        }

        self.requests_made += 1;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiMessages {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

impl ApiMessages {
    fn check(&self) -> Result<(), StockDataError> {
        if let Some(msg) = &self.error_message {
            if msg.contains("Invalid API call") || msg.contains("not found") {
                return Err(StockDataError::SymbolNotFound(msg.clone()));
            }
            return Err(StockDataError::ProviderError(msg.clone()));
        }
        for msg in [&self.note, &self.information].into_iter().flatten() {
            if msg.contains("call frequency") || msg.contains("rate limit") {
                return Err(StockDataError::RateLimitExceeded);
            }
            if msg.contains("premium") {
                return Err(StockDataError::ProviderError(msg.clone()));
            }
            if msg.contains("apikey") || msg.contains("API key") {
                return Err(StockDataError::InvalidApiKey(msg.clone()));
            }
            log::warn!("Alpha Vantage notice: {msg}");
        }
        Ok(())
    }
}

/// TIME_SERIES_DAILY response
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyBar>>,
    #[serde(flatten)]
    messages: ApiMessages,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

/// CURRENCY_EXCHANGE_RATE response
#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    rate: Option<ExchangeRate>,
    #[serde(flatten)]
    messages: ApiMessages,
}

#[derive(Debug, Deserialize)]
struct ExchangeRate {
    #[serde(rename = "5. Exchange Rate")]
    exchange_rate: String,
}

/// NEWS_SENTIMENT response, only the fields we read
#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    feed: Option<Vec<NewsItem>>,
    #[serde(flatten)]
    messages: ApiMessages,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
}

/// OVERVIEW response, analyst fields only
#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "AnalystRatingStrongBuy")]
    strong_buy: Option<String>,
    #[serde(rename = "AnalystRatingBuy")]
    buy: Option<String>,
    #[serde(rename = "AnalystRatingHold")]
    hold: Option<String>,
    #[serde(rename = "AnalystRatingSell")]
    sell: Option<String>,
    #[serde(rename = "AnalystRatingStrongSell")]
    strong_sell: Option<String>,
    #[serde(flatten)]
    messages: ApiMessages,
}

/// Parse a number Alpha Vantage sends as a string ("None" and "-" count as zero)
fn parse_count(value: &Option<String>) -> u32 {
    value
        .as_deref()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

fn parse_f64(value: &str, what: &str) -> Result<f64, StockDataError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| StockDataError::ParseError(format!("{what} '{value}': {e}")))
}

/// Keep the most recent `points` closes, oldest first
fn closes_from_series(
    series: &BTreeMap<String, DailyBar>,
    points: usize,
) -> Result<Vec<f64>, StockDataError> {
    // Dates are YYYY-MM-DD so the map is already chronological
    let skip = series.len().saturating_sub(points);
    series
        .iter()
        .skip(skip)
        .map(|(date, bar)| parse_f64(&bar.close, &format!("close on {date}")))
        .collect()
}

/// Alpha Vantage market data provider
pub struct AlphaVantageProvider {
    client: Option<ApiClient>,
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    rate_limit: Mutex<RateLimitState>,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider
    pub fn new() -> Self {
        Self {
            client: None,
            http: reqwest::Client::new(),
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: Mutex::new(RateLimitState::default()),
        }
    }

    /// Wait until the per-minute request budget has room
    async fn acquire_rate_limit(&self) {
        loop {
            let wait = {
                let mut rate_limit = self.rate_limit.lock().await;
                match rate_limit.try_acquire(Instant::now()) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };
            log::debug!("Alpha Vantage request budget used up, waiting {wait:?}");
            tokio::time::sleep(wait).await;
        }
    }

    /// Get the client, ensuring it's initialized
    fn get_client(&self) -> Result<&ApiClient, StockDataError> {
        self.client
            .as_ref()
            .ok_or_else(|| StockDataError::ConfigError("Provider not initialized".to_string()))
    }

    /// GET the query endpoint and decode the JSON body
    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, StockDataError> {
        self.get_client()?;
        self.acquire_rate_limit().await;

        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", self.api_key.as_str()));

        let url = reqwest::Url::parse_with_params(&self.base_url, &all_params)
            .map_err(|e| StockDataError::ConfigError(format!("Failed to build URL: {e}")))?;
        log::debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(StockDataError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(StockDataError::NetworkError(format!("HTTP {status}")));
        }

        Ok(response.json::<T>().await?)
    }
}

impl Default for AlphaVantageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    async fn initialize(&mut self, config: ProviderConfig) -> Result<(), StockDataError> {
        if config.api_key.is_empty() {
            return Err(StockDataError::InvalidApiKey(
                "API key is required".to_string(),
            ));
        }

        if let Some(rate_limit) = config.rate_limit {
            let mut rl = self.rate_limit.lock().await;
            rl.requests_per_minute = rate_limit.max(1);
        }

        self.http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| StockDataError::ConfigError(format!("Failed to build HTTP client: {e}")))?;
        if let Some(base_url) = config.base_url {
            self.base_url = base_url;
        }
        self.client = Some(ApiClient::set_api(&config.api_key, self.http.clone()));
        self.api_key = config.api_key;

        log::info!("Alpha Vantage provider initialized successfully");
        Ok(())
    }

    async fn get_quote(&self, symbol: &str) -> Result<StockQuote, StockDataError> {
        let client = self.get_client()?;
        self.acquire_rate_limit().await;

        log::debug!("Fetching quote for symbol: {}", symbol);

        let quote = client.quote(symbol).json().await?;

        Ok(StockQuote {
            symbol: quote.symbol().to_uppercase(),
            price: quote.price(),
            change: quote.change(),
            change_percent: quote.change_percent(),
            previous_close: quote.previous(),
            timestamp: Utc::now(),
        })
    }

    async fn get_history(&self, symbol: &str, points: usize) -> Result<Vec<f64>, StockDataError> {
        let output_size = if points > COMPACT_POINTS { "full" } else { "compact" };
        log::debug!("Fetching {points} daily closes for {symbol} ({output_size})");

        let response: TimeSeriesResponse = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", output_size),
            ])
            .await?;
        response.messages.check()?;

        let series = response
            .time_series
            .ok_or_else(|| StockDataError::SymbolNotFound(symbol.to_string()))?;
        closes_from_series(&series, points)
    }

    async fn get_fx_rate(&self, from: &str, to: &str) -> Result<f64, StockDataError> {
        log::debug!("Fetching exchange rate {from}/{to}");

        let response: ExchangeRateResponse = self
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", from),
                ("to_currency", to),
            ])
            .await?;
        response.messages.check()?;

        let rate = response
            .rate
            .ok_or_else(|| StockDataError::SymbolNotFound(format!("{from}/{to}")))?;
        parse_f64(&rate.exchange_rate, "exchange rate")
    }

    async fn get_news(&self, symbol: &str, limit: usize) -> Result<Vec<StockNews>, StockDataError> {
        log::debug!("Searching news for {symbol}");

        let limit = limit.to_string();
        let response: NewsResponse = self
            .query(&[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", symbol),
                ("limit", limit.as_str()),
            ])
            .await?;
        response.messages.check()?;

        Ok(response
            .feed
            .unwrap_or_default()
            .into_iter()
            .map(|item| StockNews {
                title: item.title,
                source: item.source,
                url: item.url,
            })
            .collect())
    }

    async fn get_analyst_ratings(&self, symbol: &str) -> Result<AnalystRatings, StockDataError> {
        log::debug!("Fetching analyst ratings for {symbol}");

        let response: OverviewResponse = self
            .query(&[("function", "OVERVIEW"), ("symbol", symbol)])
            .await?;
        response.messages.check()?;

        // An unknown symbol comes back as an empty object
        if response.symbol.is_none() {
            return Err(StockDataError::SymbolNotFound(symbol.to_string()));
        }

        Ok(AnalystRatings {
            strong_buy: parse_count(&response.strong_buy),
            buy: parse_count(&response.buy),
            hold: parse_count(&response.hold),
            sell: parse_count(&response.sell),
            strong_sell: parse_count(&response.strong_sell),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = AlphaVantageProvider::new();
        assert_eq!(provider.name(), "Alpha Vantage");
        assert!(provider.client.is_none());
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_rate_limit_state() {
        let state = RateLimitState::default();
        assert_eq!(state.requests_made, 0);
        assert_eq!(state.requests_per_minute, 5);
    }

    #[test]
    fn test_rate_limit_blocks_when_budget_used() {
        let start = Instant::now();
        let mut state = RateLimitState {
            requests_made: 0,
            window_start: start,
            requests_per_minute: 2,
        };

        assert!(state.try_acquire(start).is_ok());
        assert!(state.try_acquire(start).is_ok());
        let wait = state.try_acquire(start + Duration::from_secs(20)).unwrap_err();
        assert_eq!(wait, Duration::from_secs(40));

        // A new window frees the budget again
        assert!(state.try_acquire(start + Duration::from_secs(61)).is_ok());
        assert_eq!(state.requests_made, 1);
    }

    #[tokio::test]
    async fn test_initialization_with_empty_api_key() {
        let mut provider = AlphaVantageProvider::new();
        let config = ProviderConfig {
            api_key: String::new(),
            ..Default::default()
        };

        let result = provider.initialize(config).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), StockDataError::InvalidApiKey(_)));
    }

    #[tokio::test]
    async fn test_initialization_with_valid_config() {
        let mut provider = AlphaVantageProvider::new();
        let config = ProviderConfig {
            api_key: "test_key".to_string(),
            rate_limit: Some(10),
            base_url: Some("http://localhost:9999/query".to_string()),
            ..Default::default()
        };

        let result = provider.initialize(config).await;
        assert!(result.is_ok());
        assert!(provider.client.is_some());
        assert_eq!(provider.base_url, "http://localhost:9999/query");
        assert_eq!(provider.rate_limit.lock().await.requests_per_minute, 10);
    }

    #[tokio::test]
    async fn test_get_quote_without_initialization() {
        let provider = AlphaVantageProvider::new();
        let result = provider.get_quote("AAPL").await;
        assert!(matches!(result.unwrap_err(), StockDataError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_get_history_without_initialization() {
        let provider = AlphaVantageProvider::new();
        let result = provider.get_history("AAPL", 300).await;
        assert!(matches!(result.unwrap_err(), StockDataError::ConfigError(_)));
    }

    #[test]
    fn test_time_series_parsing_keeps_latest_points_in_order() {
        let body = r#"{
            "Meta Data": {"2. Symbol": "NVDA"},
            "Time Series (Daily)": {
                "2024-05-03": {"1. open": "1.0", "4. close": "103.5"},
                "2024-05-01": {"1. open": "1.0", "4. close": "101.0"},
                "2024-05-02": {"1. open": "1.0", "4. close": "102.25"}
            }
        }"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        assert!(response.messages.check().is_ok());

        let series = response.time_series.unwrap();
        assert_eq!(closes_from_series(&series, 10).unwrap(), vec![101.0, 102.25, 103.5]);
        assert_eq!(closes_from_series(&series, 2).unwrap(), vec![102.25, 103.5]);
    }

    #[test]
    fn test_time_series_bad_close_is_parse_error() {
        let body = r#"{"Time Series (Daily)": {"2024-05-01": {"4. close": "n/a"}}}"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        let result = closes_from_series(&response.time_series.unwrap(), 5);
        assert!(matches!(result, Err(StockDataError::ParseError(_))));
    }

    #[test]
    fn test_api_messages_classification() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;
        let response: ExchangeRateResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response.messages.check(), Err(StockDataError::RateLimitExceeded)));

        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation"}"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response.messages.check(), Err(StockDataError::SymbolNotFound(_))));
    }

    #[test]
    fn test_premium_notice_is_provider_error() {
        let body = r#"{"Information": "Thank you for using Alpha Vantage! This is a premium endpoint. You may subscribe to any of the premium plans at https://www.alphavantage.co/premium/ to instantly unlock all premium endpoints"}"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        assert!(response.time_series.is_none());
        match response.messages.check() {
            Err(StockDataError::ProviderError(msg)) => assert!(msg.contains("premium endpoint")),
            other => panic!("expected provider error, got {other:?}"),
        }

        // Daily quota notices also mention premium plans but stay rate limits
        let body = r#"{"Information": "We have detected your API key as demo and our standard API rate limit is 25 requests per day. Please subscribe to any of the premium plans"}"#;
        let response: NewsResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response.messages.check(), Err(StockDataError::RateLimitExceeded)));
    }

    #[test]
    fn test_exchange_rate_parsing() {
        let body = r#"{
            "Realtime Currency Exchange Rate": {
                "1. From_Currency Code": "USD",
                "3. To_Currency Code": "ILS",
                "5. Exchange Rate": "3.71250000"
            }
        }"#;
        let response: ExchangeRateResponse = serde_json::from_str(body).unwrap();
        let rate = parse_f64(&response.rate.unwrap().exchange_rate, "exchange rate").unwrap();
        assert!((rate - 3.7125).abs() < 1e-12);
    }

    #[test]
    fn test_news_parsing_with_empty_feed() {
        let body = r#"{"items": "0", "feed": []}"#;
        let response: NewsResponse = serde_json::from_str(body).unwrap();
        assert!(response.feed.unwrap().is_empty());

        let body = r#"{"feed": [{"title": "Nvidia earnings beat", "url": "https://x", "source": "Wire", "summary": "..."}]}"#;
        let response: NewsResponse = serde_json::from_str(body).unwrap();
        let feed = response.feed.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Nvidia earnings beat");
    }

    #[test]
    fn test_overview_rating_counts() {
        let body = r#"{
            "Symbol": "AAPL",
            "AnalystRatingStrongBuy": "7",
            "AnalystRatingBuy": "21",
            "AnalystRatingHold": "12",
            "AnalystRatingSell": "None",
            "AnalystRatingStrongSell": "-"
        }"#;
        let response: OverviewResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parse_count(&response.strong_buy), 7);
        assert_eq!(parse_count(&response.buy), 21);
        assert_eq!(parse_count(&response.hold), 12);
        assert_eq!(parse_count(&response.sell), 0);
        assert_eq!(parse_count(&response.strong_sell), 0);
    }
}
