//! Diagnostic endpoint for the current candidate pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    /// When set, refresh the catalog before answering.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub count: usize,
}

/// GET /api/models - Current candidates, with optional forced refresh.
async fn list_models(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelsQuery>,
) -> Json<ModelsResponse> {
    if query.force {
        if let Err(e) = state.catalog.refresh(&state.openrouter_client).await {
            tracing::warn!("Forced model refresh failed: {}", e);
        }
    }

    let models = state.catalog.candidates().await;
    let count = models.len();
    Json(ModelsResponse { models, count })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/models", get(list_models))
        .with_state(state)
}
