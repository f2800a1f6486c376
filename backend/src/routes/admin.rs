//! Administrative endpoints for the suppressed-model list.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoredModelsResponse {
    pub ignored_models: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SuppressRequest {
    pub model: String,
}

async fn ignored_models_response(state: &AppState) -> IgnoredModelsResponse {
    let ignored_models = state.catalog.suppressed().await;
    let count = ignored_models.len();
    IgnoredModelsResponse {
        ignored_models,
        count,
    }
}

/// GET /api/ignored-models - Current suppressed set.
async fn list_ignored(State(state): State<Arc<AppState>>) -> Json<IgnoredModelsResponse> {
    Json(ignored_models_response(&state).await)
}

/// POST /api/ignored-models - Suppress one model id.
async fn suppress_model(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuppressRequest>,
) -> Result<Json<IgnoredModelsResponse>, (StatusCode, String)> {
    if request.model.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Model is required and must be a non-empty string".to_string(),
        ));
    }

    state.catalog.suppress(&request.model).await;
    Ok(Json(ignored_models_response(&state).await))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/ignored-models",
            get(list_ignored).post(suppress_model),
        )
        .with_state(state)
}
