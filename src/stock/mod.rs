/// Market data functionality
pub mod alpha_vantage;
pub mod provider;

// Re-export commonly used types
pub use alpha_vantage::AlphaVantageProvider;
pub use provider::{
    AnalystRatings, MarketDataProvider, ProviderConfig, ProviderFactory, StockDataError,
    StockNews, StockQuote,
};
