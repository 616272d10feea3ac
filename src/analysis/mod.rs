//! Enrichment shown alongside an alert: headline sentiment, price
//! indicators and analyst consensus. Each analyzer degrades to a
//! placeholder instead of failing.

pub mod rating;
pub mod sentiment;
pub mod technical;

pub use rating::{analyze_rating, AnalystRating};
pub use sentiment::{analyze_sentiment, Sentiment};
pub use technical::{analyze_technicals, TechnicalSummary};
