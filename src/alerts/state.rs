use chrono::NaiveDate;
use std::collections::HashMap;

/// Highest alerted tier per ticker for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationState {
    day: NaiveDate,
    fired: HashMap<String, f64>,
}

impl NotificationState {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            fired: HashMap::new(),
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Highest tier already alerted for `ticker` today, if any
    pub fn last_tier(&self, ticker: &str) -> Option<f64> {
        self.fired.get(ticker).copied()
    }

    /// Record that `tier` was alerted. Lower or equal tiers are ignored.
    pub fn record(&mut self, ticker: &str, tier: f64) {
        let entry = self.fired.entry(ticker.to_string()).or_insert(tier);
        if tier > *entry {
            *entry = tier;
        }
    }

    /// Start a fresh day. Returns true when the state was cleared.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if today == self.day {
            return false;
        }
        self.day = today;
        self.fired.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_record_is_monotonic() {
        let mut state = NotificationState::new(day(1));
        assert_eq!(state.last_tier("NVDA"), None);

        state.record("NVDA", 6.0);
        state.record("NVDA", 3.0);
        assert_eq!(state.last_tier("NVDA"), Some(6.0));

        state.record("NVDA", 9.0);
        assert_eq!(state.last_tier("NVDA"), Some(9.0));
        assert_eq!(state.last_tier("AAPL"), None);
    }

    #[test]
    fn test_roll_over_clears_on_new_day() {
        let mut state = NotificationState::new(day(1));
        state.record("AAPL", 3.0);

        assert!(!state.roll_over(day(1)));
        assert_eq!(state.last_tier("AAPL"), Some(3.0));

        assert!(state.roll_over(day(2)));
        assert_eq!(state.last_tier("AAPL"), None);
        assert_eq!(state.day(), day(2));
    }
}
