//! Voice Scam Shield API Server
//!
//! REST surface for the live dashboard: call controls, live risk view,
//! alert list and actions, language preferences, demo recording analysis
//! and Prometheus metrics.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod rate_limit;
mod routes;
mod settings;

pub use error::{ApiError, ApiResult};
pub use rate_limit::{create_governor_config, RateLimitConfig};
pub use settings::{DemoSettings, LoggingSettings, ServerSettings, SettingsError, ShieldSettings};

use alerting::{AlertManager, AnnouncementDispatcher, LogAnnouncer};
use call_monitor::{CallMonitor, MonitorEvent};
use rate_limit::DefaultGovernorConfig;
use risk_signal::{RiskSource, RngSource, SignalSampler};

/// Application state shared across handlers
pub struct AppState {
    /// Live call monitor (owns the alert manager and dispatcher)
    pub monitor: CallMonitor,
    /// Random source for demo recording verdicts
    pub analysis_source: Mutex<Box<dyn RiskSource>>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state
    pub fn new(
        monitor: CallMonitor,
        analysis_source: Box<dyn RiskSource>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            monitor,
            analysis_source: Mutex::new(analysis_source),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics,
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub call_active: bool,
    pub monitoring: bool,
    pub active_alerts: usize,
    pub voice_alerts_enabled: bool,
}

/// Wire the monitor, alert manager and announcer from settings
pub fn build_monitor(settings: &ShieldSettings) -> CallMonitor {
    let mut alerts = AlertManager::new();
    if settings.demo.seed_alerts {
        alerts.seed_demo(Utc::now());
    }
    let alerts = alerts.shared();

    let dispatcher = AnnouncementDispatcher::new(
        alerts.clone(),
        Arc::new(LogAnnouncer),
        settings.alerts.clone(),
    );

    let sampler = SignalSampler::new(settings.sampler.clone(), build_risk_source(settings));

    CallMonitor::new(settings.monitor.clone(), sampler, alerts, dispatcher)
}

/// Random source, seeded when the demo settings ask for repeatable runs
pub fn build_risk_source(settings: &ShieldSettings) -> Box<dyn RiskSource> {
    match settings.demo.random_seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    }
}

/// Create the application router without rate limiting
pub fn create_router(state: SharedState) -> Router {
    build_router(state, None)
}

fn build_router(state: SharedState, limiter: Option<Arc<DefaultGovernorConfig>>) -> Router {
    let mut controls = Router::new()
        .route("/api/v1/call/start", post(routes::call::start_call))
        .route("/api/v1/call/end", post(routes::call::end_call))
        .route("/api/v1/call/pause", post(routes::call::pause))
        .route("/api/v1/call/resume", post(routes::call::resume))
        .route("/api/v1/alerts/voice", put(routes::alerts::set_voice_alerts))
        .route("/api/v1/alerts/:id/dismiss", post(routes::alerts::dismiss_alert))
        .route("/api/v1/alerts/:id/announce", post(routes::alerts::announce_alert))
        .route("/api/v1/languages/:code/toggle", post(routes::languages::toggle_language));

    if let Some(config) = limiter {
        controls = controls.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/call/live", get(routes::call::get_live))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:id", get(routes::alerts::get_alert))
        .route("/api/v1/languages", get(routes::languages::get_languages))
        .route("/api/v1/demo/samples", get(routes::demo::get_samples))
        .route("/api/v1/demo/samples/:id/analysis", get(routes::demo::analyze_sample))
        .route("/metrics", get(metrics_handler))
        .merge(controls)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.monitor.snapshot().await;
    let active_alerts = state.monitor.alerts().lock().await.active_count();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        call_active: snapshot.active,
        monitoring: snapshot.active && snapshot.listening,
        active_alerts,
        voice_alerts_enabled: state.monitor.dispatcher().is_enabled(),
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    let result = if settings.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))
}

/// Log monitor events until the channel closes
fn spawn_event_log(mut events: broadcast::Receiver<MonitorEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MonitorEvent::AlertRaised(alert)) => {
                    info!("New {} alert: {}", alert.severity, alert.title);
                }
                Ok(MonitorEvent::TierChanged { from, to }) => {
                    info!("Risk tier {} -> {}", from, to);
                }
                Ok(event) => debug!("Monitor event: {:?}", event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event log lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Run the server
pub async fn run_server(
    settings: ShieldSettings,
    metrics: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    let addr = settings.bind_addr()?;
    let monitor = build_monitor(&settings);
    spawn_event_log(monitor.subscribe());

    // seeded critical alerts are spoken like live ones
    monitor.dispatcher().dispatch_due().await;

    let state = Arc::new(AppState::new(monitor, build_risk_source(&settings), metrics));
    let app = build_router(state, create_governor_config(&settings.rate_limit));

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_reports_state() {
        let (app, _) = app(true);

        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["call_active"], false);
        assert_eq!(body["active_alerts"], 2);

        send(&app, "POST", "/api/v1/call/start", None).await;
        let (_, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(body["call_active"], true);
        assert_eq!(body["monitoring"], true);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (app, _) = app(false);
        let (status, _) = send(&app, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
