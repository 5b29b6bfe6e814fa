//! Alert Manager Implementation
//!
//! Alerts are never removed. Dismissal hides an alert from the active list
//! for good, and the announced flag flips false -> true at most once.

use crate::{Alert, AlertCategory};
use chrono::{DateTime, Duration, Utc};
use risk_signal::AlertSeverity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Alert manager shared between the tick task and user actions
pub type SharedAlertManager = Arc<Mutex<AlertManager>>;

/// Alert and announcement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Speak critical alerts automatically (default: true)
    pub voice_alerts_enabled: bool,
    /// Delay before an alert is spoken (default: 1000 ms)
    pub announcement_delay_ms: u64,
    /// Speech rate passed to the announcer (default: 0.9)
    pub speech_rate: f32,
    /// Speech volume passed to the announcer (default: 0.7)
    pub speech_volume: f32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            voice_alerts_enabled: true,
            announcement_delay_ms: 1000,
            speech_rate: 0.9,
            speech_volume: 0.7,
        }
    }
}

/// Append-only alert store
#[derive(Debug, Default)]
pub struct AlertManager {
    /// Alerts in insertion order
    alerts: Vec<Alert>,
    /// Position of each alert by id
    index: HashMap<Uuid, usize>,
}

impl AlertManager {
    /// Create an empty alert manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in the shared handle used across tasks
    pub fn shared(self) -> SharedAlertManager {
        Arc::new(Mutex::new(self))
    }

    /// Create and store a new alert
    pub fn raise(
        &mut self,
        category: AlertCategory,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Alert {
        self.raise_at(category, severity, title, message, Utc::now())
    }

    /// Create and store a new alert with an explicit creation time
    pub fn raise_at(
        &mut self,
        category: AlertCategory,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Alert {
        let alert = Alert::new(category, severity, title.into(), message.into(), created_at);
        self.index.insert(alert.id, self.alerts.len());
        self.alerts.push(alert.clone());

        metrics::counter!("shield_alerts_raised_total", "severity" => severity.as_str())
            .increment(1);
        info!(
            "Alert raised: {} [{} / {}] {}",
            alert.id,
            category.as_str(),
            severity,
            alert.title
        );
        alert
    }

    /// Seed the two alerts the dashboard demo opens with
    pub fn seed_demo(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        let synthetic = self.raise_at(
            AlertCategory::Synthetic,
            AlertSeverity::High,
            "Synthetic Voice Detected",
            "AI-generated voice patterns identified. Caller may be using voice cloning technology.",
            now - Duration::seconds(5),
        );
        let scam = self.raise_at(
            AlertCategory::Scam,
            AlertSeverity::Critical,
            "Bank Impersonation Scam",
            "Caller claims to be from bank security but requesting sensitive information. Do not share account details.",
            now - Duration::seconds(15),
        );
        vec![synthetic.id, scam.id]
    }

    /// Dismiss an alert. Returns true only when this call changed its state.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        match self.get_mut(id) {
            Some(alert) if !alert.dismissed => {
                alert.dismissed = true;
                info!("Alert dismissed: {}", id);
                true
            }
            Some(_) => {
                debug!("Alert {} already dismissed", id);
                false
            }
            None => {
                debug!("Dismiss ignored for unknown alert {}", id);
                false
            }
        }
    }

    /// Mark an alert as spoken. Returns true only on the first call.
    pub fn mark_announced(&mut self, id: Uuid) -> bool {
        match self.get_mut(id) {
            Some(alert) if !alert.announced => {
                alert.announced = true;
                debug!("Alert announced: {}", id);
                true
            }
            _ => false,
        }
    }

    /// Non-dismissed alerts, in insertion order
    pub fn active_alerts(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.is_active()).collect()
    }

    /// Active critical alerts that have not been spoken yet
    pub fn due_for_announcement(&self) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|a| a.is_due_for_announcement())
            .collect()
    }

    /// Select due alerts and mark them announced in one step
    pub fn take_due_for_announcement(&mut self) -> Vec<Alert> {
        let mut taken = Vec::new();
        for alert in self.alerts.iter_mut() {
            if alert.is_due_for_announcement() {
                alert.announced = true;
                taken.push(alert.clone());
            }
        }
        if !taken.is_empty() {
            debug!("{} alert(s) selected for announcement", taken.len());
        }
        taken
    }

    /// Look up an alert by id
    pub fn get(&self, id: Uuid) -> Option<&Alert> {
        self.index.get(&id).and_then(|&i| self.alerts.get(i))
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut Alert> {
        let i = *self.index.get(&id)?;
        self.alerts.get_mut(i)
    }

    /// Every alert ever raised, dismissed ones included
    pub fn history(&self) -> &[Alert] {
        &self.alerts
    }

    /// Number of active alerts
    pub fn active_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_active()).count()
    }

    /// Total number of alerts raised
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
