//! Call Routes

use axum::{body::Bytes, extract::State, Json};
use call_monitor::{CallerInfo, LiveSnapshot};

use crate::{ApiError, ApiResult, SharedState};

/// Current live view
pub async fn get_live(State(state): State<SharedState>) -> Json<LiveSnapshot> {
    Json(state.monitor.snapshot().await)
}

/// Start a call. An empty body uses the demo caller; anything else must be
/// a valid caller object.
pub async fn start_call(
    State(state): State<SharedState>,
    body: Bytes,
) -> ApiResult<Json<LiveSnapshot>> {
    let caller = parse_caller(&body)?;
    Ok(Json(state.monitor.start_call(caller).await?))
}

fn parse_caller(body: &[u8]) -> ApiResult<CallerInfo> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CallerInfo::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid caller: {e}")))
}

pub async fn end_call(State(state): State<SharedState>) -> ApiResult<Json<LiveSnapshot>> {
    Ok(Json(state.monitor.end_call().await?))
}

pub async fn pause(State(state): State<SharedState>) -> ApiResult<Json<LiveSnapshot>> {
    Ok(Json(state.monitor.pause().await?))
}

pub async fn resume(State(state): State<SharedState>) -> ApiResult<Json<LiveSnapshot>> {
    Ok(Json(state.monitor.resume().await?))
}
