//! Severity Classifier
//!
//! Two step functions over the same risk scale: a three-tier mapping for the
//! live meter and a four-level mapping for discrete alerts. Scores are
//! clamped to [0, 100] before classification and NaN counts as 0.

use crate::error::SignalError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Live meter tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Safe,
    Suspicious,
    ScamAlert,
}

impl SeverityTier {
    /// Label shown next to the meter
    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Safe => "Safe",
            SeverityTier::Suspicious => "Suspicious",
            SeverityTier::ScamAlert => "Scam Alert",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    /// Parse the lowercase form used on the wire
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Some(AlertSeverity::Low),
            "medium" => Some(AlertSeverity::Medium),
            "high" => Some(AlertSeverity::High),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds (inclusive) of the live meter tiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Scores at or below this are Safe (default: 30)
    pub safe_max: f64,
    /// Scores at or below this are Suspicious (default: 70)
    pub suspicious_max: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            safe_max: 30.0,
            suspicious_max: 70.0,
        }
    }
}

/// Upper bounds (inclusive) of the alert severity levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Default: 30
    pub low_max: f64,
    /// Default: 50
    pub medium_max: f64,
    /// Default: 70
    pub high_max: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            low_max: 30.0,
            medium_max: 50.0,
            high_max: 70.0,
        }
    }
}

impl TierThresholds {
    /// Bounds must be on the 0-100 scale and ascending
    pub fn validate(&self) -> Result<(), SignalError> {
        check_ascending(&[
            ("safe_max", self.safe_max),
            ("suspicious_max", self.suspicious_max),
        ])
    }
}

impl AlertThresholds {
    /// Bounds must be on the 0-100 scale and ascending
    pub fn validate(&self) -> Result<(), SignalError> {
        check_ascending(&[
            ("low_max", self.low_max),
            ("medium_max", self.medium_max),
            ("high_max", self.high_max),
        ])
    }
}

fn check_ascending(bounds: &[(&'static str, f64)]) -> Result<(), SignalError> {
    // NaN fails the range check
    for &(field, value) in bounds {
        if !(0.0..=100.0).contains(&value) {
            return Err(SignalError::OutOfScale { field, value });
        }
    }

    for pair in bounds.windows(2) {
        let (_, min) = pair[0];
        let (field, max) = pair[1];
        if min > max {
            return Err(SignalError::InvertedBounds { field, min, max });
        }
    }

    Ok(())
}

fn normalize(risk_score: f64) -> f64 {
    if risk_score.is_nan() {
        0.0
    } else {
        risk_score.clamp(0.0, 100.0)
    }
}

/// Classify a risk score for the live meter using default thresholds
pub fn classify(risk_score: f64) -> SeverityTier {
    classify_with(risk_score, &TierThresholds::default())
}

/// Classify a risk score for the live meter
pub fn classify_with(risk_score: f64, thresholds: &TierThresholds) -> SeverityTier {
    let score = normalize(risk_score);
    if score <= thresholds.safe_max {
        SeverityTier::Safe
    } else if score <= thresholds.suspicious_max {
        SeverityTier::Suspicious
    } else {
        SeverityTier::ScamAlert
    }
}

/// Map a risk score to an alert severity using default thresholds
pub fn classify_alert(risk_score: f64) -> AlertSeverity {
    classify_alert_with(risk_score, &AlertThresholds::default())
}

/// Map a risk score to an alert severity
pub fn classify_alert_with(risk_score: f64, thresholds: &AlertThresholds) -> AlertSeverity {
    let score = normalize(risk_score);
    if score <= thresholds.low_max {
        AlertSeverity::Low
    } else if score <= thresholds.medium_max {
        AlertSeverity::Medium
    } else if score <= thresholds.high_max {
        AlertSeverity::High
    } else {
        AlertSeverity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tier_sequence() {
        let tiers: Vec<_> = [15.0, 40.0, 75.0].into_iter().map(classify).collect();
        assert_eq!(
            tiers,
            vec![
                SeverityTier::Safe,
                SeverityTier::Suspicious,
                SeverityTier::ScamAlert
            ]
        );
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(classify(30.0), SeverityTier::Safe);
        assert_eq!(classify(30.01), SeverityTier::Suspicious);
        assert_eq!(classify(70.0), SeverityTier::Suspicious);
        assert_eq!(classify(70.01), SeverityTier::ScamAlert);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(classify(-12.0), SeverityTier::Safe);
        assert_eq!(classify(250.0), SeverityTier::ScamAlert);
        assert_eq!(classify(f64::NAN), SeverityTier::Safe);
        assert_eq!(classify(f64::INFINITY), SeverityTier::ScamAlert);
    }

    #[test]
    fn test_alert_levels() {
        assert_eq!(classify_alert(10.0), AlertSeverity::Low);
        assert_eq!(classify_alert(45.0), AlertSeverity::Medium);
        assert_eq!(classify_alert(65.0), AlertSeverity::High);
        assert_eq!(classify_alert(71.0), AlertSeverity::Critical);
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = TierThresholds {
            safe_max: 10.0,
            suspicious_max: 40.0,
        };
        assert_eq!(classify_with(15.0, &strict), SeverityTier::Suspicious);
        assert_eq!(classify_with(45.0, &strict), SeverityTier::ScamAlert);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(TierThresholds::default().validate().is_ok());
        assert!(AlertThresholds::default().validate().is_ok());

        let nan = TierThresholds {
            safe_max: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(SignalError::OutOfScale {
                field: "safe_max",
                ..
            })
        ));

        let off_scale = AlertThresholds {
            high_max: 120.0,
            ..Default::default()
        };
        assert!(matches!(
            off_scale.validate(),
            Err(SignalError::OutOfScale {
                field: "high_max",
                ..
            })
        ));

        let inverted = AlertThresholds {
            low_max: 60.0,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(SignalError::InvertedBounds {
                field: "medium_max",
                ..
            })
        ));
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(AlertSeverity::parse("CRITICAL"), Some(AlertSeverity::Critical));
        assert_eq!(AlertSeverity::parse("urgent"), None);
        assert_eq!(AlertSeverity::High.to_string(), "high");
        assert_eq!(SeverityTier::ScamAlert.to_string(), "Scam Alert");
    }

    proptest! {
        #[test]
        fn prop_classify_monotonic(a in -50.0f64..150.0, b in -50.0f64..150.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(lo) <= classify(hi));
            prop_assert!(classify_alert(lo) <= classify_alert(hi));
        }

        #[test]
        fn prop_classify_deterministic(score in any::<f64>()) {
            prop_assert_eq!(classify(score), classify(score));
            prop_assert_eq!(classify_alert(score), classify_alert(score));
        }
    }
}
