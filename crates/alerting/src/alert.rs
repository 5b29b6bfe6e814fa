//! Alert Records

use chrono::{DateTime, Utc};
use risk_signal::AlertSeverity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of risk condition an alert reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    /// Scam script or impersonation
    Scam,
    /// Cloned or generated voice
    Synthetic,
    /// Unusual patterns short of a confirmed scam
    Suspicious,
}

impl AlertCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Scam => "scam",
            AlertCategory::Synthetic => "synthetic",
            AlertCategory::Suspicious => "suspicious",
        }
    }
}

/// User-facing record of a detected risk condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub dismissed: bool,
    pub announced: bool,
}

impl Alert {
    pub(crate) fn new(
        category: AlertCategory,
        severity: AlertSeverity,
        title: String,
        message: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            severity,
            title,
            message,
            created_at,
            dismissed: false,
            announced: false,
        }
    }

    /// Still shown to the user
    pub fn is_active(&self) -> bool {
        !self.dismissed
    }

    /// Critical, active and not yet spoken
    pub fn is_due_for_announcement(&self) -> bool {
        self.severity == AlertSeverity::Critical && !self.dismissed && !self.announced
    }
}
