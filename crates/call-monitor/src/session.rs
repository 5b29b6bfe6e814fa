//! Call session state

use risk_signal::{RiskSample, SeverityTier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who is on the other end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    pub number: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl Default for CallerInfo {
    fn default() -> Self {
        Self {
            number: "+1 (555) 123-4567".to_string(),
            location: Some("New York, NY".to_string()),
            verified: false,
        }
    }
}

/// Status indicator colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Inactive,
    Safe,
    Warning,
    Danger,
}

impl CallStatus {
    fn from_tier(tier: SeverityTier) -> Self {
        match tier {
            SeverityTier::Safe => CallStatus::Safe,
            SeverityTier::Suspicious => CallStatus::Warning,
            SeverityTier::ScamAlert => CallStatus::Danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceAnalysis {
    pub is_authentic: bool,
    pub confidence: f64,
}

/// Everything the presentation layer needs to render the live view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub active: bool,
    pub listening: bool,
    pub status: CallStatus,
    pub duration_secs: u64,
    pub duration_display: String,
    pub sample: RiskSample,
    pub risk_percent: u8,
    pub tier: SeverityTier,
    pub tier_label: String,
    pub scam_warning: bool,
    pub caller: CallerInfo,
    pub voice: VoiceAnalysis,
    pub detected_language: String,
    /// What has been heard so far, only while a call is active
    pub transcript: Option<String>,
}

/// Format seconds as `mm:ss`
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Mutable state of the current (or last) call
#[derive(Debug, Clone)]
pub(crate) struct CallSession {
    pub active: bool,
    pub listening: bool,
    pub duration: Duration,
    pub caller: CallerInfo,
    pub voice_authentic: bool,
    pub latest: RiskSample,
    pub tier: SeverityTier,
    pub transcript: String,
}

impl CallSession {
    pub fn idle(initial: RiskSample, tier: SeverityTier) -> Self {
        Self {
            active: false,
            listening: true,
            duration: Duration::ZERO,
            caller: CallerInfo::default(),
            voice_authentic: true,
            latest: initial,
            tier,
            transcript: String::new(),
        }
    }

    pub fn start(
        caller: CallerInfo,
        transcript: String,
        initial: RiskSample,
        tier: SeverityTier,
    ) -> Self {
        Self {
            active: true,
            caller,
            transcript,
            ..Self::idle(initial, tier)
        }
    }

    /// Ticks are only processed while this holds
    pub fn is_monitoring(&self) -> bool {
        self.active && self.listening
    }

    pub fn record(&mut self, sample: RiskSample, tier: SeverityTier, elapsed: Duration) {
        self.latest = sample;
        self.tier = tier;
        self.duration += elapsed;
    }

    pub fn snapshot(&self, scam_warning_above: f64, detected_language: &str) -> LiveSnapshot {
        let duration_secs = self.duration.as_secs();
        LiveSnapshot {
            active: self.active,
            listening: self.listening,
            status: if self.active {
                CallStatus::from_tier(self.tier)
            } else {
                CallStatus::Inactive
            },
            duration_secs,
            duration_display: format_duration(duration_secs),
            sample: self.latest,
            risk_percent: self.latest.risk_percent(),
            tier: self.tier,
            tier_label: self.tier.label().to_string(),
            scam_warning: self.active && self.latest.risk_score > scam_warning_above,
            caller: self.caller.clone(),
            voice: VoiceAnalysis {
                is_authentic: self.voice_authentic,
                confidence: self.latest.confidence,
            },
            detected_language: detected_language.to_string(),
            transcript: self.active.then(|| self.transcript.clone()),
        }
    }
}
