use crate::stock::{MarketDataProvider, StockNews};
use std::fmt;

const POSITIVE_KEYWORDS: [&str; 4] = ["beat", "surge", "gain", "growth"];
const NEGATIVE_KEYWORDS: [&str; 4] = ["miss", "drop", "loss", "fall"];
const POSITIVE_CUTOFF: f64 = 0.2;
const NEGATIVE_CUTOFF: f64 = -0.2;

/// Headline sentiment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    /// The news search failed
    Unavailable,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Unavailable => write!(f, "unavailable"),
        }
    }
}

fn mentions_any(title: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| title.contains(keyword))
}

/// Score headlines by counting articles that mention positive vs negative keywords
pub fn classify_headlines(articles: &[StockNews]) -> Sentiment {
    if articles.is_empty() {
        return Sentiment::Neutral;
    }

    let (positive, negative) = articles.iter().fold((0i64, 0i64), |(pos, neg), article| {
        let title = article.title.to_lowercase();
        (
            pos + mentions_any(&title, &POSITIVE_KEYWORDS) as i64,
            neg + mentions_any(&title, &NEGATIVE_KEYWORDS) as i64,
        )
    });

    let score = (positive - negative) as f64 / articles.len() as f64;
    if score > POSITIVE_CUTOFF {
        Sentiment::Positive
    } else if score < NEGATIVE_CUTOFF {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Search news for `symbol` and classify the headlines
pub async fn analyze_sentiment(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    limit: usize,
) -> Sentiment {
    match provider.get_news(symbol, limit).await {
        Ok(articles) => {
            for article in &articles {
                log::trace!("{symbol} headline from {}: {} <{}>", article.source, article.title, article.url);
            }
            let sentiment = classify_headlines(&articles);
            log::debug!("{symbol}: {} headlines, sentiment {sentiment}", articles.len());
            sentiment
        }
        Err(e) => {
            log::warn!("⚠️ News search failed for {symbol}: {e}");
            Sentiment::Unavailable
        }
    }
}
