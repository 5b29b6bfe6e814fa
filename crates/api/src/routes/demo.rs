//! Demo Recording Routes

use axum::{
    extract::{Path, State},
    Json,
};
use risk_signal::{find_demo_sample, DemoSample, SampleAnalysis, DEMO_SAMPLES};
use serde::Serialize;

use crate::{ApiError, ApiResult, SharedState};

#[derive(Debug, Serialize)]
pub struct SamplesResponse {
    pub data: Vec<DemoSample>,
    pub count: usize,
}

/// Demo recording catalog
pub async fn get_samples() -> Json<SamplesResponse> {
    Json(SamplesResponse {
        data: DEMO_SAMPLES.to_vec(),
        count: DEMO_SAMPLES.len(),
    })
}

/// Fresh verdict for one recording
pub async fn analyze_sample(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SampleAnalysis>> {
    let sample = find_demo_sample(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Demo sample {id} not found")))?;

    let mut source = state.analysis_source.lock().await;
    Ok(Json(risk_signal::analyze_sample(sample, &mut **source)))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_catalog() {
        let (app, _) = app(false);
        let (status, body) = send(&app, "GET", "/api/v1/demo/samples", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 5);
        assert_eq!(body["data"][0]["id"], "001");
        assert_eq!(body["data"][0]["kind"], "bonafide");
    }

    #[tokio::test]
    async fn test_bonafide_analysis_is_low_risk() {
        let (app, _) = app(false);
        let (status, body) = send(&app, "GET", "/api/v1/demo/samples/002/analysis", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sample_id"], "002");
        let risk = body["risk_score"].as_f64().unwrap();
        assert!((15.0..=25.0).contains(&risk));
        assert_eq!(body["tier"], "safe");
        let authenticity = body["authenticity_percent"].as_u64().unwrap();
        assert_eq!(authenticity, (100.0 - risk).floor() as u64);
    }

    #[tokio::test]
    async fn test_unknown_sample_is_not_found() {
        let (app, _) = app(false);
        let (status, body) = send(&app, "GET", "/api/v1/demo/samples/042/analysis", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }
}
