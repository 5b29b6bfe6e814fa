//! Call Monitor Implementation

use crate::language::LanguagePreferences;
use crate::session::{CallSession, CallerInfo, LiveSnapshot};
use crate::MonitorError;
use alerting::{Alert, AlertCategory, AnnouncementDispatcher, SharedAlertManager};
use chrono::Utc;
use risk_signal::{
    classify_alert_with, classify_with, AlertThresholds, RiskSource, SeverityTier, SignalSampler,
    TierThresholds,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Event channel capacity
const EVENT_CAPACITY: usize = 256;

const START_CUE: &str = "Demo call started. Voice Scam Shield is now monitoring for threats.";

/// Transcript shown for the simulated call
pub const DEMO_TRANSCRIPT: &str = "Hello, this is Sarah from your bank's security department. \
    We've detected some unusual activity on your account...";

/// Configuration for the call monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampling period in milliseconds (default: 1000)
    pub tick_interval_ms: u64,
    /// Live meter tier bounds
    pub tiers: TierThresholds,
    /// Alert severity bounds
    pub alert_levels: AlertThresholds,
    /// Risk above which the scam warning banner shows (default: 50)
    pub scam_warning_above: f64,
    /// Transcript attached to each new call
    pub transcript: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            tiers: TierThresholds::default(),
            alert_levels: AlertThresholds::default(),
            scam_warning_above: 50.0,
            transcript: DEMO_TRANSCRIPT.to_string(),
        }
    }
}

impl MonitorConfig {
    /// Period between ticks, never zero
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    CallStarted { caller: CallerInfo },
    CallEnded { duration_secs: u64 },
    MonitoringPaused,
    MonitoringResumed,
    Sample(LiveSnapshot),
    TierChanged {
        from: SeverityTier,
        to: SeverityTier,
    },
    AlertRaised(Alert),
}

/// Running tick loop
struct Ticker {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct MonitorState {
    session: CallSession,
    sampler: SignalSampler<Box<dyn RiskSource>>,
    languages: LanguagePreferences,
    ticker: Option<Ticker>,
    /// Bumped on every ticker spawn so a stale loop can recognise itself
    generation: u64,
}

struct Inner {
    config: MonitorConfig,
    state: Mutex<MonitorState>,
    alerts: SharedAlertManager,
    dispatcher: AnnouncementDispatcher,
    events: broadcast::Sender<MonitorEvent>,
}

/// Live call monitor
///
/// One tick task runs per active, listening call. The session lock is held
/// for the whole of a tick, and every tick re-checks under that lock that
/// monitoring is still on and that it belongs to the current ticker, so
/// nothing is processed after `end_call` or `pause` returns.
#[derive(Clone)]
pub struct CallMonitor {
    inner: Arc<Inner>,
}

impl CallMonitor {
    /// Create an idle monitor
    pub fn new(
        config: MonitorConfig,
        sampler: SignalSampler<Box<dyn RiskSource>>,
        alerts: SharedAlertManager,
        dispatcher: AnnouncementDispatcher,
    ) -> Self {
        let initial = sampler.config().initial_sample(Utc::now());
        let tier = classify_with(initial.risk_score, &config.tiers);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            "Call monitor created (tick every {:?})",
            config.tick_interval()
        );

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(MonitorState {
                    session: CallSession::idle(initial, tier),
                    sampler,
                    languages: LanguagePreferences::default(),
                    ticker: None,
                    generation: 0,
                }),
                config,
                alerts,
                dispatcher,
                events,
            }),
        }
    }

    /// Subscribe to monitor events
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    pub fn alerts(&self) -> &SharedAlertManager {
        &self.inner.alerts
    }

    pub fn dispatcher(&self) -> &AnnouncementDispatcher {
        &self.inner.dispatcher
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Current live view
    pub async fn snapshot(&self) -> LiveSnapshot {
        let state = self.inner.state.lock().await;
        self.snapshot_of(&state)
    }

    /// Whether a tick loop is currently running
    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.ticker.is_some()
    }

    /// Start monitoring a new call
    pub async fn start_call(&self, caller: CallerInfo) -> Result<LiveSnapshot, MonitorError> {
        let snapshot = {
            let mut state = self.inner.state.lock().await;
            if state.session.active {
                return Err(MonitorError::CallAlreadyActive);
            }

            let initial = state.sampler.config().initial_sample(Utc::now());
            let tier = classify_with(initial.risk_score, &self.inner.config.tiers);
            state.session = CallSession::start(
                caller.clone(),
                self.inner.config.transcript.clone(),
                initial,
                tier,
            );
            self.spawn_ticker(&mut state);
            self.snapshot_of(&state)
        };

        info!("Call started with {}", caller.number);
        self.publish(MonitorEvent::CallStarted { caller });
        self.inner.dispatcher.cue(START_CUE);
        Ok(snapshot)
    }

    /// Stop monitoring the current call
    pub async fn end_call(&self) -> Result<LiveSnapshot, MonitorError> {
        let (snapshot, stopped, duration_secs) = {
            let mut state = self.inner.state.lock().await;
            if !state.session.active {
                return Err(MonitorError::NoActiveCall);
            }

            let duration_secs = state.session.duration.as_secs();
            state.session.active = false;
            state.session.listening = true;
            state.session.duration = Duration::ZERO;
            let stopped = Self::stop_ticker(&mut state);
            (self.snapshot_of(&state), stopped, duration_secs)
        };

        Self::join_ticker(stopped).await;
        info!("Call ended after {}s", duration_secs);
        self.publish(MonitorEvent::CallEnded { duration_secs });
        self.inner
            .dispatcher
            .cue("Call ended. Voice Scam Shield monitoring stopped.");
        Ok(snapshot)
    }

    /// Pause sampling without ending the call
    pub async fn pause(&self) -> Result<LiveSnapshot, MonitorError> {
        let (snapshot, stopped) = {
            let mut state = self.inner.state.lock().await;
            if !state.session.active {
                return Err(MonitorError::NoActiveCall);
            }
            if !state.session.listening {
                return Ok(self.snapshot_of(&state));
            }

            state.session.listening = false;
            let stopped = Self::stop_ticker(&mut state);
            (self.snapshot_of(&state), stopped)
        };

        Self::join_ticker(stopped).await;
        info!("Monitoring paused");
        self.publish(MonitorEvent::MonitoringPaused);
        self.inner.dispatcher.cue("Monitoring paused");
        Ok(snapshot)
    }

    /// Resume sampling after a pause
    pub async fn resume(&self) -> Result<LiveSnapshot, MonitorError> {
        let snapshot = {
            let mut state = self.inner.state.lock().await;
            if !state.session.active {
                return Err(MonitorError::NoActiveCall);
            }
            if state.session.listening {
                return Ok(self.snapshot_of(&state));
            }

            state.session.listening = true;
            self.spawn_ticker(&mut state);
            self.snapshot_of(&state)
        };

        info!("Monitoring resumed");
        self.publish(MonitorEvent::MonitoringResumed);
        self.inner.dispatcher.cue("Monitoring resumed");
        Ok(snapshot)
    }

    /// Process one tick by hand. Returns `None` when monitoring is off.
    pub async fn tick(&self, elapsed: Duration) -> Option<LiveSnapshot> {
        self.advance(elapsed, None).await
    }

    /// Current language preferences
    pub async fn languages(&self) -> LanguagePreferences {
        self.inner.state.lock().await.languages.clone()
    }

    /// Flip a language in the monitored set
    pub async fn toggle_language(&self, code: &str) -> Result<LanguagePreferences, MonitorError> {
        let mut state = self.inner.state.lock().await;
        let selected = state.languages.toggle(code)?;
        let verb = if selected { "selected" } else { "deselected" };
        debug!("Language {} {}", code, verb);
        Ok(state.languages.clone())
    }

    /// Record the language heard on the call
    pub async fn set_detected_language(&self, code: &str) -> Result<(), MonitorError> {
        self.inner.state.lock().await.languages.set_detected(code)?;
        Ok(())
    }

    async fn advance(&self, elapsed: Duration, generation: Option<u64>) -> Option<LiveSnapshot> {
        let mut state = self.inner.state.lock().await;
        if !state.session.is_monitoring() {
            debug!("Tick dropped: monitoring is off");
            return None;
        }
        if generation.is_some_and(|g| g != state.generation) {
            debug!("Tick dropped: stale tick loop");
            return None;
        }

        let previous = state.session.latest;
        let sample = state.sampler.sample(&previous, elapsed);
        let from = state.session.tier;
        let to = classify_with(sample.risk_score, &self.inner.config.tiers);
        state.session.record(sample, to, elapsed);

        metrics::counter!("shield_ticks_total").increment(1);
        metrics::gauge!("shield_risk_score").set(sample.risk_score);

        let raised = match escalation(from, to) {
            Some(tier) => Some(self.raise_for(tier, sample.risk_score).await),
            None => None,
        };
        let snapshot = self.snapshot_of(&state);
        drop(state);

        if from != to {
            debug!("Tier changed: {} -> {}", from, to);
            self.publish(MonitorEvent::TierChanged { from, to });
        }
        if let Some(alert) = raised {
            self.publish(MonitorEvent::AlertRaised(alert));
        }
        self.publish(MonitorEvent::Sample(snapshot.clone()));

        // spawned, never waits on speech
        self.inner.dispatcher.dispatch_due().await;
        Some(snapshot)
    }

    async fn raise_for(&self, tier: SeverityTier, risk_score: f64) -> Alert {
        let severity = classify_alert_with(risk_score, &self.inner.config.alert_levels);
        let mut alerts = self.inner.alerts.lock().await;
        match tier {
            SeverityTier::ScamAlert => alerts.raise(
                AlertCategory::Scam,
                severity,
                "Potential Scam Detected",
                format!(
                    "Risk score reached {:.0}%. Do not share personal or account details.",
                    risk_score
                ),
            ),
            _ => alerts.raise(
                AlertCategory::Suspicious,
                severity,
                "Suspicious Call Pattern",
                "Multiple suspicious patterns identified. Exercise caution.",
            ),
        }
    }

    fn spawn_ticker(&self, state: &mut MonitorState) {
        if let Some(old) = state.ticker.take() {
            warn!("Replacing a running tick loop");
            let _ = old.cancel.send(true);
        }

        state.generation += 1;
        let generation = state.generation;
        let period = self.inner.config.tick_interval();
        let (cancel, mut cancelled) = watch::channel(false);
        let monitor = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.changed() => break,
                    _ = ticker.tick() => {
                        if *cancelled.borrow() {
                            break;
                        }
                        if monitor.advance(period, Some(generation)).await.is_none() {
                            break;
                        }
                    }
                }
            }
            debug!("Tick loop {} stopped", generation);
        });

        state.ticker = Some(Ticker { cancel, task });
    }

    fn stop_ticker(state: &mut MonitorState) -> Option<JoinHandle<()>> {
        let ticker = state.ticker.take()?;
        let _ = ticker.cancel.send(true);
        Some(ticker.task)
    }

    async fn join_ticker(task: Option<JoinHandle<()>>) {
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Tick loop ended abnormally: {}", e);
            }
        }
    }

    fn snapshot_of(&self, state: &MonitorState) -> LiveSnapshot {
        state.session.snapshot(
            self.inner.config.scam_warning_above,
            state.languages.detected().name,
        )
    }

    fn publish(&self, event: MonitorEvent) {
        // no subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

/// Tier reached by an upward move, if it warrants an alert
fn escalation(from: SeverityTier, to: SeverityTier) -> Option<SeverityTier> {
    (to > from && to != SeverityTier::Safe).then_some(to)
}
