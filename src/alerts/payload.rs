use super::error::ComputeError;
use crate::analysis::{AnalystRating, Sentiment, TechnicalSummary};

/// Everything an alert message reports about one ticker
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    pub ticker: String,
    /// Tier that triggered this alert
    pub tier: f64,
    pub day_change_percent: f64,
    /// Currency the portfolio is valued in, e.g. "ILS"
    pub local_currency: String,
    pub buy_price_local: f64,
    pub current_price_local: f64,
    /// Fractional gain, 0.05 means +5%
    pub nominal_gain: f64,
    /// Fractional gain with currency movement since purchase removed
    pub real_gain: f64,
    pub sentiment: Sentiment,
    pub technical: TechnicalSummary,
    pub rating: AnalystRating,
    /// Day change minus the benchmark's day change, when the benchmark was available
    pub benchmark_delta: Option<f64>,
}

/// Gain in local currency: `(current - buy) / buy`
pub fn nominal_gain(buy_price_local: f64, current_price_local: f64) -> Result<f64, ComputeError> {
    if buy_price_local == 0.0 {
        return Err(ComputeError::ZeroCostBasis);
    }
    finite(
        (current_price_local - buy_price_local) / buy_price_local,
        "nominal gain",
    )
}

/// Gain with both prices valued at the same (current) exchange rate.
///
/// The rate cancels out, leaving the move of the instrument in its own
/// currency against the cost basis converted at the purchase rate.
pub fn real_gain(
    buy_price_local: f64,
    buy_fx_rate: f64,
    current_price_foreign: f64,
) -> Result<f64, ComputeError> {
    if buy_price_local == 0.0 {
        return Err(ComputeError::ZeroCostBasis);
    }
    if buy_fx_rate == 0.0 {
        return Err(ComputeError::ZeroPurchaseFxRate);
    }
    let buy_price_foreign = buy_price_local / buy_fx_rate;
    finite(
        (current_price_foreign - buy_price_foreign) / buy_price_foreign,
        "real gain",
    )
}

fn finite(value: f64, what: &'static str) -> Result<f64, ComputeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputeError::NonFinite(what))
    }
}
