use std::time::Duration;

use tokio::net::TcpListener;

use hivemind_backend::{app_router, logging, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init(&config.logging.level);

    tracing::info!("Starting Hivemind backend");
    if config.openrouter.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY not set; questions will be rejected until it is");
    }

    let state = AppState::from_config(config.clone());

    // Catalog refresh: once at startup, then on a fixed interval.
    let refresh_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(
            refresh_state.config.catalog.refresh_interval_secs,
        ));
        loop {
            interval.tick().await;
            match refresh_state
                .catalog
                .refresh(&refresh_state.openrouter_client)
                .await
            {
                Ok(count) => tracing::debug!("Catalog refreshed, {} models", count),
                Err(e) => tracing::warn!("Catalog refresh failed, keeping previous list: {}", e),
            }
        }
    });

    let app = app_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
