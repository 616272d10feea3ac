use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ticker {0} is listed more than once")]
    DuplicateTicker(String),
}

/// A tracked holding and what it cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(skip)]
    pub ticker: String,
    /// Cost basis per share in the portfolio's currency
    pub buy_price_local: f64,
    /// Exchange rate at the time of purchase
    pub buy_fx_rate: f64,
}

/// Positions keyed by ticker, iterated in ticker order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    positions: BTreeMap<String, Position>,
}

impl Portfolio {
    pub fn new(positions: impl IntoIterator<Item = Position>) -> Self {
        Self {
            positions: positions
                .into_iter()
                .map(|position| (position.ticker.clone(), position))
                .collect(),
        }
    }

    /// Parse a JSON object mapping ticker to position
    ///
    /// ```json
    /// { "NVDA": { "buy_price_local": 590.0, "buy_fx_rate": 3.72 } }
    /// ```
    ///
    /// Tickers are case-insensitive, so `nvda` and `NVDA` in one file is an error.
    pub fn from_json(json: &str) -> Result<Self, PortfolioError> {
        let raw: BTreeMap<String, Position> = serde_json::from_str(json)?;
        let mut positions = BTreeMap::new();
        for (key, mut position) in raw {
            let ticker = key.trim().to_uppercase();
            if positions.contains_key(&ticker) {
                return Err(PortfolioError::DuplicateTicker(ticker));
            }
            position.ticker = ticker.clone();
            positions.insert(ticker, position);
        }
        Ok(Self::new(positions.into_values()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let to_error = |message: String| ConfigError::Portfolio {
            path: path.display().to_string(),
            message,
        };

        let json = std::fs::read_to_string(path).map_err(|e| to_error(e.to_string()))?;
        let portfolio = Self::from_json(&json).map_err(|e| to_error(e.to_string()))?;
        if portfolio.is_empty() {
            return Err(to_error("no positions defined".to_string()));
        }
        Ok(portfolio)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = r#"{
            "NVDA": {"buy_price_local": 590.0, "buy_fx_rate": 3.72},
            "aapl": {"buy_price_local": 520.0, "buy_fx_rate": 3.68}
        }"#;
        let portfolio = Portfolio::from_json(json).unwrap();

        assert_eq!(portfolio.len(), 2);
        let tickers: Vec<&str> = portfolio.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "NVDA"]);

        let nvda = portfolio.iter().find(|p| p.ticker == "NVDA").unwrap();
        assert_eq!(nvda.buy_price_local, 590.0);
        assert_eq!(nvda.buy_fx_rate, 3.72);
    }

    #[test]
    fn test_from_json_rejects_missing_fields() {
        let json = r#"{"NVDA": {"buy_price_local": 590.0}}"#;
        assert!(Portfolio::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_rejects_case_folded_duplicates() {
        let json = r#"{
            "nvda": {"buy_price_local": 590.0, "buy_fx_rate": 3.72},
            "NVDA ": {"buy_price_local": 610.0, "buy_fx_rate": 3.65}
        }"#;
        match Portfolio::from_json(json) {
            Err(PortfolioError::DuplicateTicker(ticker)) => assert_eq!(ticker, "NVDA"),
            other => panic!("expected duplicate ticker error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_reports_duplicate_ticker() {
        let path = std::env::temp_dir().join(format!("portfolio-dup-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"aapl": {"buy_price_local": 520.0, "buy_fx_rate": 3.68},
                "AAPL": {"buy_price_local": 530.0, "buy_fx_rate": 3.70}}"#,
        )
        .unwrap();

        let result = Portfolio::load(&path);
        std::fs::remove_file(&path).ok();

        match result {
            Err(ConfigError::Portfolio { message, .. }) => {
                assert_eq!(message, "ticker AAPL is listed more than once")
            }
            other => panic!("expected duplicate ticker error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = Portfolio::load(Path::new("/nonexistent/portfolio.json"));
        assert!(matches!(result, Err(ConfigError::Portfolio { .. })));
    }

    #[test]
    fn test_load_rejects_empty_portfolio() {
        let path = std::env::temp_dir().join(format!("portfolio-empty-{}.json", std::process::id()));
        std::fs::write(&path, "{}").unwrap();

        let result = Portfolio::load(&path);
        std::fs::remove_file(&path).ok();

        match result {
            Err(ConfigError::Portfolio { message, .. }) => assert_eq!(message, "no positions defined"),
            other => panic!("expected empty portfolio error, got {other:?}"),
        }
    }
}
