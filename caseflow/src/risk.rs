//! Risk display derivation for fetched prediction probabilities.
//!
//! The model reports a survival probability; the console shows the
//! complementary risk of death. The mapping lives here once instead of
//! being re-derived at every render site.

use serde::{Deserialize, Serialize};

/// Band used to colour the displayed risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Elevated,
}

/// Threshold in percent separating the two display bands.
pub const ELEVATED_RISK_PERCENT: f64 = 45.0;

/// Displayed risk percent for a model probability, rounded to whole
/// percent and clamped into 0..=100.
pub fn risk_percent(probability: f64) -> u8 {
    (((1.0 - probability) * 100.0).round()).clamp(0.0, 100.0) as u8
}

/// Display band for a model probability. The comparison uses the
/// unrounded percent so values just under the threshold stay low.
pub fn risk_band(probability: f64) -> RiskBand {
    if (1.0 - probability) * 100.0 < ELEVATED_RISK_PERCENT {
        RiskBand::Low
    } else {
        RiskBand::Elevated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_percent() {
        assert_eq!(risk_percent(1.0), 0);
        assert_eq!(risk_percent(0.0), 100);
        assert_eq!(risk_percent(0.25), 75);
        assert_eq!(risk_percent(0.554), 45);
    }

    #[test]
    fn test_risk_percent_clamps_out_of_range_inputs() {
        assert_eq!(risk_percent(1.4), 0);
        assert_eq!(risk_percent(-0.2), 100);
    }

    #[test]
    fn test_risk_band_threshold() {
        assert_eq!(risk_band(0.56), RiskBand::Low); // 44.0%
        assert_eq!(risk_band(0.55), RiskBand::Elevated); // 45.0%
        assert_eq!(risk_band(0.2), RiskBand::Elevated);
        // Just under the threshold stays low even though it rounds to 45.
        assert_eq!(risk_band(0.551), RiskBand::Low);
    }
}
