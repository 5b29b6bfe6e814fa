//! Alerting System
//!
//! Append-only alert store with a dismiss/announce lifecycle, and a
//! dispatcher that hands critical alerts to a speech collaborator once.

mod alert;
mod announcer;
mod manager;

pub use alert::{Alert, AlertCategory};
pub use announcer::{
    AnnounceError, Announcement, AnnouncementDispatcher, Announcer, LogAnnouncer,
};
pub use manager::{AlertConfig, AlertManager, SharedAlertManager};
pub use risk_signal::AlertSeverity;
