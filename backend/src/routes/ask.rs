//! Question submission endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
    pub model_count: usize,
}

/// POST /api/ask - Accept a question and start the fan-out.
///
/// Returns as soon as the models are selected; results stream to the
/// session's WebSocket as they arrive.
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let receipt = state
        .dispatch_engine
        .handle_question(&request.question, &request.session_id)
        .await
        .map_err(|e| {
            let status = match e {
                DispatchError::EmptyQuestion | DispatchError::EmptySessionId => {
                    StatusCode::BAD_REQUEST
                }
                DispatchError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })?;

    Ok(Json(AskResponse {
        success: true,
        message: "Request received. Results will be streamed via WebSocket.".to_string(),
        session_id: receipt.session_id,
        model_count: receipt.models.len(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/api/ask", post(ask)).with_state(state)
}
