pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod llm;
pub mod logging;
pub mod routes;
pub mod test_util;

pub use catalog::ModelCatalog;
pub use config::Config;
pub use dispatch::{DispatchEngine, DispatchError, DispatchReceipt, FALLBACK_MODELS};
pub use gateway::SessionRegistry;
pub use llm::OpenRouterClient;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Model catalog refreshed from OpenRouter.
    pub catalog: Arc<ModelCatalog>,
    /// Registry of connected client sessions.
    pub session_registry: Arc<SessionRegistry>,
    /// OpenRouter HTTP client.
    pub openrouter_client: Arc<OpenRouterClient>,
    /// Fan-out engine.
    pub dispatch_engine: Arc<DispatchEngine>,
}

impl AppState {
    /// Build all components from configuration.
    pub fn from_config(config: Config) -> Arc<Self> {
        let catalog = Arc::new(ModelCatalog::new(
            config.catalog.suppressed_models.iter().cloned(),
        ));
        let session_registry = Arc::new(SessionRegistry::new());
        let openrouter_client = Arc::new(OpenRouterClient::new(
            &config.openrouter.base_url,
            config.openrouter.api_key.clone(),
            Duration::from_secs(config.openrouter.request_timeout_secs),
            &config.openrouter.referer,
        ));
        let dispatch_engine = Arc::new(DispatchEngine::new(
            Arc::clone(&catalog),
            Arc::clone(&session_registry),
            Arc::clone(&openrouter_client),
            config.dispatch.max_models,
        ));

        Arc::new(AppState {
            config,
            catalog,
            session_registry,
            openrouter_client,
            dispatch_engine,
        })
    }
}

/// Build the full application router.
pub fn app_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::ask::router(state.clone()))
        .merge(routes::models::router(state.clone()))
        .merge(routes::admin::router(state.clone()))
        .route("/ws", get(gateway::ws_handler).with_state(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(logging::request_logger))
}
