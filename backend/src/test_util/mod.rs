//! Helpers shared by unit and integration tests.

pub mod mock_openrouter;

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use hivemind_common::ServerEvent;

use crate::config::{
    CatalogConfig, Config, CorsConfig, DispatchConfig, LoggingConfig, OpenRouterConfig,
};
use crate::AppState;

/// Configuration pointing at a test upstream (usually a wiremock server).
pub fn test_config(openrouter_base_url: &str, api_key: Option<&str>) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        openrouter: OpenRouterConfig {
            api_key: api_key.map(String::from),
            base_url: openrouter_base_url.to_string(),
            request_timeout_secs: 5,
            referer: "http://localhost:3000".to_string(),
        },
        dispatch: DispatchConfig { max_models: 15 },
        catalog: CatalogConfig {
            refresh_interval_secs: 3600,
            suppressed_models: vec![],
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
    }
}

/// Full application state wired to the given upstream, with a credential.
pub fn test_state(openrouter_base_url: &str) -> Arc<AppState> {
    AppState::from_config(test_config(openrouter_base_url, Some("test-key")))
}

/// Register a session directly, bypassing the WebSocket layer, and hand back
/// the receiving end of its event channel.
pub async fn open_session(state: &AppState) -> (String, mpsc::Receiver<ServerEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let session_id = Uuid::new_v4().to_string();
    state
        .session_registry
        .register(session_id.clone(), tx)
        .await;
    (session_id, rx)
}
