//! Alert Routes

use alerting::{Alert, AlertSeverity};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, ApiResult, SharedState};

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by severity
    pub severity: Option<String>,
    /// Include dismissed alerts (history view)
    #[serde(default)]
    pub include_dismissed: bool,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
    pub active_count: usize,
    pub voice_alerts_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct DismissResponse {
    pub id: Uuid,
    pub dismissed: bool,
    /// False when the alert was already dismissed
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct AnnounceResponse {
    pub id: Uuid,
    /// Whether this request caused the alert to be spoken
    pub announced: bool,
}

#[derive(Debug, Deserialize)]
pub struct VoiceAlertsRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct VoiceAlertsResponse {
    pub enabled: bool,
    /// Pending critical alerts handed to the announcer by this change
    pub dispatched: usize,
}

/// Get alerts in the order they were raised
pub async fn get_alerts(
    State(state): State<SharedState>,
    Query(params): Query<AlertQuery>,
) -> ApiResult<Json<AlertResponse>> {
    let severity = params
        .severity
        .as_deref()
        .map(|s| {
            AlertSeverity::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown severity: {s}")))
        })
        .transpose()?;
    let limit = params.limit.min(500);

    let alerts = state.monitor.alerts().lock().await;
    let data: Vec<Alert> = alerts
        .history()
        .iter()
        .filter(|a| params.include_dismissed || a.is_active())
        .filter(|a| severity.map_or(true, |s| a.severity == s))
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(AlertResponse {
        count: data.len(),
        active_count: alerts.active_count(),
        voice_alerts_enabled: state.monitor.dispatcher().is_enabled(),
        data,
    }))
}

/// Get a single alert, dismissed or not
pub async fn get_alert(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Alert>> {
    state
        .monitor
        .alerts()
        .lock()
        .await
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Alert {id} not found")))
}

/// Dismiss an alert. Repeating the request is harmless.
pub async fn dismiss_alert(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DismissResponse>> {
    let mut alerts = state.monitor.alerts().lock().await;
    if alerts.get(id).is_none() {
        return Err(ApiError::NotFound(format!("Alert {id} not found")));
    }
    let changed = alerts.dismiss(id);

    Ok(Json(DismissResponse {
        id,
        dismissed: true,
        changed,
    }))
}

/// Speak an alert now if it has not been spoken yet
pub async fn announce_alert(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AnnounceResponse>> {
    if state.monitor.alerts().lock().await.get(id).is_none() {
        return Err(ApiError::NotFound(format!("Alert {id} not found")));
    }
    let announced = state.monitor.dispatcher().announce_now(id).await.is_some();

    Ok(Json(AnnounceResponse { id, announced }))
}

/// Turn automatic voice alerts on or off
pub async fn set_voice_alerts(
    State(state): State<SharedState>,
    Json(request): Json<VoiceAlertsRequest>,
) -> Json<VoiceAlertsResponse> {
    let dispatched = state
        .monitor
        .dispatcher()
        .set_enabled(request.enabled)
        .await
        .len();

    Json(VoiceAlertsResponse {
        enabled: request.enabled,
        dispatched,
    })
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, send};
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_seeded_alerts_listed_in_order() {
        let (app, _) = app(true);
        let (status, body) = send(&app, "GET", "/api/v1/alerts", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["title"], "Synthetic Voice Detected");
        assert_eq!(body["data"][1]["severity"], "critical");
        assert_eq!(body["voice_alerts_enabled"], true);
    }

    #[tokio::test]
    async fn test_severity_filter() {
        let (app, _) = app(true);

        let (_, body) = send(&app, "GET", "/api/v1/alerts?severity=critical", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["category"], "scam");

        let (status, _) = send(&app, "GET", "/api/v1/alerts?severity=urgent", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dismiss_is_idempotent() {
        let (app, _) = app(true);
        let (_, body) = send(&app, "GET", "/api/v1/alerts", None).await;
        let id = body["data"][0]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/alerts/{id}/dismiss");

        let (status, first) = send(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["changed"], true);

        let (status, second) = send(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["changed"], false);

        let (_, body) = send(&app, "GET", "/api/v1/alerts", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["active_count"], 1);

        let (_, body) = send(&app, "GET", "/api/v1/alerts?include_dismissed=true", None).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["dismissed"], true);
    }

    #[tokio::test]
    async fn test_unknown_alert_is_not_found() {
        let (app, state) = app(true);
        let before = state.monitor.alerts().lock().await.history().to_vec();

        let uri = format!("/api/v1/alerts/{}/dismiss", Uuid::new_v4());
        let (status, body) = send(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);

        let after = state.monitor.alerts().lock().await.history().to_vec();
        assert_eq!(before, after);

        let (status, _) = send(&app, "POST", "/api/v1/alerts/not-a-uuid/dismiss", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_manual_announce_once() {
        let (app, _) = app(true);
        let (_, body) = send(&app, "GET", "/api/v1/alerts?severity=high", None).await;
        let id = body["data"][0]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/alerts/{id}/announce");

        let (_, first) = send(&app, "POST", &uri, None).await;
        assert_eq!(first["announced"], true);
        let (_, second) = send(&app, "POST", &uri, None).await;
        assert_eq!(second["announced"], false);

        let (_, alert) = send(&app, "GET", &format!("/api/v1/alerts/{id}"), None).await;
        assert_eq!(alert["announced"], true);
    }

    #[tokio::test]
    async fn test_voice_toggle_dispatches_pending() {
        let (app, state) = app(false);

        let (_, body) = send(
            &app,
            "PUT",
            "/api/v1/alerts/voice",
            Some(json!({ "enabled": false })),
        )
        .await;
        assert_eq!(body["enabled"], false);

        let now = chrono::Utc::now();
        state.monitor.alerts().lock().await.seed_demo(now);

        let (_, body) = send(
            &app,
            "PUT",
            "/api/v1/alerts/voice",
            Some(json!({ "enabled": true })),
        )
        .await;
        assert_eq!(body["dispatched"], 1);
        let alerts = state.monitor.alerts().lock().await;
        assert!(alerts.due_for_announcement().is_empty());
    }
}
