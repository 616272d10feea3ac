use crate::stock::{AnalystRatings, MarketDataProvider};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::StrongBuy => write!(f, "strong buy"),
            Recommendation::Buy => write!(f, "buy"),
            Recommendation::Hold => write!(f, "hold"),
            Recommendation::Sell => write!(f, "sell"),
            Recommendation::StrongSell => write!(f, "strong sell"),
        }
    }
}

/// Analyst consensus for an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalystRating {
    Consensus {
        recommendation: Recommendation,
        votes: u32,
        total: u32,
    },
    NoCoverage,
    Unavailable,
}

impl fmt::Display for AnalystRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalystRating::Consensus { recommendation, votes, total } => {
                write!(f, "{recommendation} ({votes}/{total} analysts)")
            }
            AnalystRating::NoCoverage => write!(f, "no coverage"),
            AnalystRating::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Pick the bucket with the most votes.
///
/// Ties go to hold first, then to the more cautious side.
pub fn consensus(ratings: &AnalystRatings) -> AnalystRating {
    let total = ratings.total();
    if total == 0 {
        return AnalystRating::NoCoverage;
    }

    let preference = [
        (Recommendation::Hold, ratings.hold),
        (Recommendation::Sell, ratings.sell),
        (Recommendation::Buy, ratings.buy),
        (Recommendation::StrongSell, ratings.strong_sell),
        (Recommendation::StrongBuy, ratings.strong_buy),
    ];

    let mut best = preference[0];
    for candidate in preference.into_iter().skip(1) {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }

    AnalystRating::Consensus {
        recommendation: best.0,
        votes: best.1,
        total,
    }
}

/// Look up analyst recommendations for `symbol`
pub async fn analyze_rating(provider: &dyn MarketDataProvider, symbol: &str) -> AnalystRating {
    match provider.get_analyst_ratings(symbol).await {
        Ok(ratings) => consensus(&ratings),
        Err(e) => {
            log::warn!("⚠️ Analyst rating lookup failed for {symbol}: {e}");
            AnalystRating::Unavailable
        }
    }
}
