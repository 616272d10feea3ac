//! Threshold alerting: tier decisions, per-day state and message rendering.

pub mod engine;
pub mod error;
pub mod message;
pub mod payload;
pub mod state;
pub mod thresholds;

pub use engine::{CycleReport, NotificationEngine};
pub use state::NotificationState;
pub use thresholds::AlertThresholds;
