use crate::dispatch::DispatchError;
use crate::stock::StockDataError;

/// Arithmetic that cannot be carried out for a position
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ComputeError {
    #[error("cost basis is zero")]
    ZeroCostBasis,

    #[error("purchase exchange rate is zero")]
    ZeroPurchaseFxRate,

    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}

/// Why a ticker was skipped during a cycle
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] StockDataError),

    #[error("computation failed: {0}")]
    Compute(#[from] ComputeError),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}
