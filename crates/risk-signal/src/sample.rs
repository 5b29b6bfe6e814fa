//! Risk Sample

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single risk observation taken during a call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSample {
    /// When the observation was taken
    pub timestamp: DateTime<Utc>,
    /// Scam likelihood estimate (0-100)
    pub risk_score: f64,
    /// Voice analysis confidence (0-100)
    pub confidence: f64,
}

impl RiskSample {
    /// Create a sample at the given instant
    pub fn new(timestamp: DateTime<Utc>, risk_score: f64, confidence: f64) -> Self {
        Self {
            timestamp,
            risk_score,
            confidence,
        }
    }

    /// Risk score rounded for display, as the meter shows it
    pub fn risk_percent(&self) -> u8 {
        self.risk_score.clamp(0.0, 100.0).round() as u8
    }
}
