use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ThresholdError {
    #[error("at least one threshold is required")]
    Empty,

    #[error("threshold '{0}' is not a number")]
    NotANumber(String),

    #[error("threshold {0} must be positive")]
    NotPositive(f64),

    #[error("thresholds must be strictly ascending ({previous} then {next})")]
    NotAscending { previous: f64, next: f64 },
}

/// Ascending percentage magnitudes that trigger alerts, e.g. 3, 6, 9, 12
#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds(Vec<f64>);

impl AlertThresholds {
    pub fn new(tiers: Vec<f64>) -> Result<Self, ThresholdError> {
        if tiers.is_empty() {
            return Err(ThresholdError::Empty);
        }
        for &tier in &tiers {
            if !(tier > 0.0) {
                return Err(ThresholdError::NotPositive(tier));
            }
        }
        for pair in tiers.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ThresholdError::NotAscending { previous: pair[0], next: pair[1] });
            }
        }
        Ok(Self(tiers))
    }

    pub fn tiers(&self) -> &[f64] {
        &self.0
    }

    /// First tier reached by `abs_change` that is above the last tier already alerted.
    ///
    /// Only one tier fires per call even if several were crossed.
    pub fn fire_tier(&self, abs_change: f64, last_tier: Option<f64>) -> Option<f64> {
        self.0
            .iter()
            .copied()
            .find(|&tier| abs_change >= tier && last_tier.is_none_or(|last| tier > last))
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self(vec![3.0, 6.0, 9.0, 12.0])
    }
}

impl FromStr for AlertThresholds {
    type Err = ThresholdError;

    /// Parse a comma separated list such as `3,6,9,12`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tiers = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<f64>()
                    .map_err(|_| ThresholdError::NotANumber(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tiers)
    }
}

impl fmt::Display for AlertThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.tiers().iter().map(|t| format!("{t}%")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_next_tier_above_last() {
        let thresholds = AlertThresholds::default();
        assert_eq!(thresholds.fire_tier(7.0, Some(3.0)), Some(6.0));
    }

    #[test]
    fn test_same_tier_does_not_refire() {
        let thresholds = AlertThresholds::default();
        assert_eq!(thresholds.fire_tier(7.0, Some(6.0)), None);
        assert_eq!(thresholds.fire_tier(9.0, Some(6.0)), Some(9.0));
    }

    #[test]
    fn test_first_crossing_fires_lowest_tier_only() {
        let thresholds = AlertThresholds::default();
        // A 13% move on a fresh day still reports the first tier
        assert_eq!(thresholds.fire_tier(13.0, None), Some(3.0));
        assert_eq!(thresholds.fire_tier(2.99, None), None);
        assert_eq!(thresholds.fire_tier(3.0, None), Some(3.0));
    }

    #[test]
    fn test_above_highest_tier() {
        let thresholds = AlertThresholds::default();
        assert_eq!(thresholds.fire_tier(50.0, Some(12.0)), None);
    }

    #[test]
    fn test_parse() {
        let thresholds: AlertThresholds = " 2.5, 5 ,10".parse().unwrap();
        assert_eq!(thresholds.tiers(), &[2.5, 5.0, 10.0]);
        assert_eq!(thresholds.to_string(), "2.5%, 5%, 10%");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<AlertThresholds>(), Err(ThresholdError::Empty));
        assert_eq!(
            "3,x".parse::<AlertThresholds>(),
            Err(ThresholdError::NotANumber("x".to_string()))
        );
        assert_eq!("0,3".parse::<AlertThresholds>(), Err(ThresholdError::NotPositive(0.0)));
        assert_eq!(
            "6,3".parse::<AlertThresholds>(),
            Err(ThresholdError::NotAscending { previous: 6.0, next: 3.0 })
        );
    }
}
