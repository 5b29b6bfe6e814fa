//! Language Routes

use axum::{
    extract::{Path, State},
    Json,
};
use call_monitor::{Language, LanguagePreferences, LANGUAGES};
use serde::Serialize;

use crate::{ApiResult, SharedState};

/// Catalog entry with its selection state
#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    #[serde(flatten)]
    pub language: Language,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub data: Vec<LanguageEntry>,
    pub selected: Vec<&'static str>,
    pub detected: Language,
}

impl From<LanguagePreferences> for LanguagesResponse {
    fn from(prefs: LanguagePreferences) -> Self {
        let data = LANGUAGES
            .iter()
            .map(|&language| LanguageEntry {
                language,
                selected: prefs.is_selected(language.code),
            })
            .collect();

        Self {
            data,
            selected: prefs.selected().to_vec(),
            detected: *prefs.detected(),
        }
    }
}

/// Language catalog and current selection
pub async fn get_languages(State(state): State<SharedState>) -> Json<LanguagesResponse> {
    Json(state.monitor.languages().await.into())
}

/// Select or deselect a supported language
pub async fn toggle_language(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> ApiResult<Json<LanguagesResponse>> {
    let prefs = state.monitor.toggle_language(&code).await?;
    Ok(Json(prefs.into()))
}
