use crate::stock::MarketDataProvider;
use std::fmt;
use ta::{indicators::SimpleMovingAverage, Next};

/// Closes needed before any indicator is reported
pub const MIN_HISTORY_POINTS: usize = 200;
const SHORT_WINDOW: usize = 50;
const LONG_WINDOW: usize = 200;
const RSI_WINDOW: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
        }
    }
}

/// Result of the technical pass over daily closes
#[derive(Debug, Clone, PartialEq)]
pub enum TechnicalSummary {
    Indicators {
        trend: Trend,
        sma_50: f64,
        sma_200: f64,
        rsi_14: f64,
    },
    InsufficientData {
        available: usize,
    },
    /// History could not be fetched
    Unavailable,
}

impl fmt::Display for TechnicalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechnicalSummary::Indicators { trend, sma_50, sma_200, rsi_14 } => write!(
                f,
                "trend {trend} | SMA50 {sma_50:.2} | SMA200 {sma_200:.2} | RSI {rsi_14:.1}"
            ),
            TechnicalSummary::InsufficientData { .. } => write!(f, "insufficient data"),
            TechnicalSummary::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Mean of the last `period` values, via a running SMA over the whole series
fn rolling_mean(period: usize, values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sma = SimpleMovingAverage::new(period).ok()?;
    values.into_iter().fold(None, |_, value| Some(sma.next(value)))
}

/// RSI with simple rolling-mean smoothing of gains and losses
pub fn relative_strength_index(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() <= period {
        return None;
    }

    // Only the last `period` moves, so a flat tail averages to exactly zero
    let window = &closes[closes.len() - period - 1..];
    let deltas: Vec<f64> = window.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let avg_gain = rolling_mean(period, deltas.iter().map(|d| d.max(0.0)))?;
    let avg_loss = rolling_mean(period, deltas.iter().map(|d| (-d).max(0.0)))?;

    if avg_loss == 0.0 {
        // Flat window has no direction
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Compute moving averages, RSI and trend from closes ordered oldest first
pub fn summarize(closes: &[f64]) -> TechnicalSummary {
    if closes.len() < MIN_HISTORY_POINTS {
        return TechnicalSummary::InsufficientData { available: closes.len() };
    }

    let indicators = (|| {
        let last_close = *closes.last()?;
        let sma_50 = rolling_mean(SHORT_WINDOW, closes.iter().copied())?;
        let sma_200 = rolling_mean(LONG_WINDOW, closes.iter().copied())?;
        let rsi_14 = relative_strength_index(closes, RSI_WINDOW)?;
        let trend = if last_close > sma_50 { Trend::Up } else { Trend::Down };
        Some(TechnicalSummary::Indicators { trend, sma_50, sma_200, rsi_14 })
    })();

    indicators.unwrap_or(TechnicalSummary::InsufficientData { available: closes.len() })
}

/// Fetch daily history for `symbol` and summarize it
pub async fn analyze_technicals(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    history_points: usize,
) -> TechnicalSummary {
    match provider.get_history(symbol, history_points).await {
        Ok(closes) => {
            let summary = summarize(&closes);
            if let TechnicalSummary::InsufficientData { available } = summary {
                log::info!(
                    "📉 {symbol}: only {available} closes, need {MIN_HISTORY_POINTS} for indicators"
                );
            }
            summary
        }
        Err(e) => {
            log::warn!("⚠️ History fetch failed for {symbol}: {e}");
            TechnicalSummary::Unavailable
        }
    }
}
