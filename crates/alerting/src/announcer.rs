//! Announcement Dispatch
//!
//! Selection and marking happen under the alert lock, so an alert is handed
//! to the announcer at most once however often dispatch is polled. Delivery
//! runs on spawned tasks and its failures are logged and dropped.

use crate::{Alert, AlertConfig, SharedAlertManager};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Speech collaborator failures
#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("Speech output unavailable: {0}")]
    Unavailable(String),
    #[error("Announcement rejected: {0}")]
    Rejected(String),
}

/// A single utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    /// Alert being spoken, `None` for status cues
    pub alert_id: Option<Uuid>,
    pub text: String,
    pub rate: f32,
    pub volume: f32,
}

/// Speech output collaborator
pub trait Announcer: Send + Sync {
    fn announce(&self, announcement: &Announcement) -> Result<(), AnnounceError>;
}

/// Announcer that writes utterances to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, announcement: &Announcement) -> Result<(), AnnounceError> {
        info!(
            target: "announcer",
            rate = announcement.rate,
            volume = announcement.volume,
            "{}",
            announcement.text
        );
        Ok(())
    }
}

/// Schedules alert announcements and status cues
#[derive(Clone)]
pub struct AnnouncementDispatcher {
    alerts: SharedAlertManager,
    announcer: Arc<dyn Announcer>,
    config: AlertConfig,
    enabled: Arc<AtomicBool>,
}

impl AnnouncementDispatcher {
    /// Create a dispatcher over a shared alert manager
    pub fn new(
        alerts: SharedAlertManager,
        announcer: Arc<dyn Announcer>,
        config: AlertConfig,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(config.voice_alerts_enabled));
        Self {
            alerts,
            announcer,
            config,
            enabled,
        }
    }

    /// Whether critical alerts are spoken
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Toggle voice alerts. Turning them on dispatches anything pending.
    pub async fn set_enabled(&self, enabled: bool) -> Vec<JoinHandle<()>> {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!("Voice alerts {}", if enabled { "on" } else { "off" });
        if enabled {
            self.dispatch_due().await
        } else {
            Vec::new()
        }
    }

    /// Hand every due alert to the announcer, each after its own delay slot
    pub async fn dispatch_due(&self) -> Vec<JoinHandle<()>> {
        if !self.is_enabled() {
            return Vec::new();
        }

        let due = self.alerts.lock().await.take_due_for_announcement();
        let delay = Duration::from_millis(self.config.announcement_delay_ms);

        due.into_iter()
            .enumerate()
            .map(|(slot, alert)| self.spawn_alert(alert, delay * (slot as u32 + 1)))
            .collect()
    }

    /// Speak one alert right away if it is active and has not been spoken
    pub async fn announce_now(&self, id: Uuid) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            debug!("Manual announcement of {} skipped: voice alerts off", id);
            return None;
        }

        let alert = {
            let mut alerts = self.alerts.lock().await;
            let alert = match alerts.get(id) {
                Some(alert) if alert.is_active() && !alert.announced => alert.clone(),
                _ => return None,
            };
            alerts.mark_announced(id);
            alert
        };

        Some(self.spawn_alert(alert, Duration::ZERO))
    }

    /// Speak a monitoring status cue
    pub fn cue(&self, text: impl Into<String>) -> JoinHandle<()> {
        let announcement = Announcement {
            alert_id: None,
            text: text.into(),
            rate: self.config.speech_rate,
            volume: self.config.speech_volume,
        };
        let announcer = Arc::clone(&self.announcer);
        tokio::spawn(async move {
            deliver(announcer.as_ref(), &announcement);
        })
    }

    fn spawn_alert(&self, alert: Alert, delay: Duration) -> JoinHandle<()> {
        let announcement = Announcement {
            alert_id: Some(alert.id),
            text: format!("Security alert: {}. {}", alert.title, alert.message),
            rate: self.config.speech_rate,
            volume: self.config.speech_volume,
        };
        let alerts = Arc::clone(&self.alerts);
        let announcer = Arc::clone(&self.announcer);

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let still_active = alerts
                .lock()
                .await
                .get(alert.id)
                .map(|a| a.is_active())
                .unwrap_or(false);
            if !still_active {
                debug!("Alert {} dismissed before it was spoken", alert.id);
                return;
            }

            deliver(announcer.as_ref(), &announcement);
        })
    }
}

fn deliver(announcer: &dyn Announcer, announcement: &Announcement) {
    match announcer.announce(announcement) {
        Ok(()) => {
            metrics::counter!("shield_announcements_total").increment(1);
        }
        Err(e) => {
            metrics::counter!("shield_announcement_failures_total").increment(1);
            warn!("Announcement failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlertCategory, AlertManager, AlertSeverity};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAnnouncer {
        spoken: Mutex<Vec<Announcement>>,
    }

    impl RecordingAnnouncer {
        fn spoken(&self) -> Vec<Announcement> {
            self.spoken.lock().unwrap().clone()
        }
    }

    impl Announcer for RecordingAnnouncer {
        fn announce(&self, announcement: &Announcement) -> Result<(), AnnounceError> {
            self.spoken.lock().unwrap().push(announcement.clone());
            Ok(())
        }
    }

    struct FailingAnnouncer;

    impl Announcer for FailingAnnouncer {
        fn announce(&self, _: &Announcement) -> Result<(), AnnounceError> {
            Err(AnnounceError::Unavailable("no audio device".into()))
        }
    }

    fn setup(announcer: Arc<dyn Announcer>) -> (SharedAlertManager, AnnouncementDispatcher) {
        let alerts = AlertManager::new().shared();
        let dispatcher =
            AnnouncementDispatcher::new(alerts.clone(), announcer, AlertConfig::default());
        (alerts, dispatcher)
    }

    async fn raise_critical(alerts: &SharedAlertManager, title: &str) -> Uuid {
        alerts
            .lock()
            .await
            .raise(
                AlertCategory::Scam,
                AlertSeverity::Critical,
                title,
                "Hang up.",
            )
            .id
    }

    async fn join(handles: Vec<JoinHandle<()>>) {
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_alert_spoken_once() {
        let recorder = Arc::new(RecordingAnnouncer::default());
        let (alerts, dispatcher) = setup(recorder.clone());
        let id = raise_critical(&alerts, "Bank Impersonation Scam").await;

        join(dispatcher.dispatch_due().await).await;
        join(dispatcher.dispatch_due().await).await;

        let spoken = recorder.spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].alert_id, Some(id));
        assert_eq!(
            spoken[0].text,
            "Security alert: Bank Impersonation Scam. Hang up."
        );
        assert!((spoken[0].rate - 0.9).abs() < f32::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_announcement_waits_for_delay() {
        let recorder = Arc::new(RecordingAnnouncer::default());
        let (alerts, dispatcher) = setup(recorder.clone());
        raise_critical(&alerts, "first").await;
        raise_critical(&alerts, "second").await;

        let handles = dispatcher.dispatch_due().await;
        assert_eq!(handles.len(), 2);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(recorder.spoken().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(recorder.spoken().len(), 1);

        join(handles).await;
        let texts: Vec<_> = recorder.spoken().into_iter().map(|a| a.text).collect();
        assert!(texts[0].contains("first"));
        assert!(texts[1].contains("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_leaves_alert_state() {
        let (alerts, dispatcher) = setup(Arc::new(FailingAnnouncer));
        let id = raise_critical(&alerts, "x").await;

        join(dispatcher.dispatch_due().await).await;

        let alerts = alerts.lock().await;
        let alert = alerts.get(id).unwrap();
        assert!(alert.announced);
        assert!(!alert.dismissed);
        assert!(alerts.due_for_announcement().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_keeps_alerts_pending() {
        let recorder = Arc::new(RecordingAnnouncer::default());
        let (alerts, dispatcher) = setup(recorder.clone());
        dispatcher.set_enabled(false).await;
        let id = raise_critical(&alerts, "x").await;

        assert!(dispatcher.dispatch_due().await.is_empty());
        assert_eq!(alerts.lock().await.due_for_announcement().len(), 1);

        join(dispatcher.set_enabled(true).await).await;
        assert_eq!(recorder.spoken().len(), 1);
        assert!(alerts.lock().await.get(id).unwrap().announced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_before_delay_is_not_spoken() {
        let recorder = Arc::new(RecordingAnnouncer::default());
        let (alerts, dispatcher) = setup(recorder.clone());
        let id = raise_critical(&alerts, "x").await;

        let handles = dispatcher.dispatch_due().await;
        alerts.lock().await.dismiss(id);
        join(handles).await;

        assert!(recorder.spoken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_announce() {
        let recorder = Arc::new(RecordingAnnouncer::default());
        let (alerts, dispatcher) = setup(recorder.clone());
        let id = alerts
            .lock()
            .await
            .raise(
                AlertCategory::Synthetic,
                AlertSeverity::High,
                "Synthetic Voice Detected",
                "m",
            )
            .id;

        let handle = dispatcher
            .announce_now(id)
            .await
            .expect("first manual announce");
        handle.await.unwrap();
        assert!(dispatcher.announce_now(id).await.is_none());
        assert!(dispatcher.announce_now(Uuid::new_v4()).await.is_none());
        assert_eq!(recorder.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_status_cue() {
        let recorder = Arc::new(RecordingAnnouncer::default());
        let (_alerts, dispatcher) = setup(recorder.clone());

        dispatcher.cue("Monitoring paused").await.unwrap();

        let spoken = recorder.spoken();
        assert_eq!(spoken[0].alert_id, None);
        assert_eq!(spoken[0].text, "Monitoring paused");
    }
}
