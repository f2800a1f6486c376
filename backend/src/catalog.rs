//! Model catalog: the live model set refreshed from OpenRouter, minus the
//! administratively suppressed set.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::llm::{OpenRouterClient, OpenRouterError};

/// Catalog of queryable models.
///
/// The externally visible candidate pool is always `live \ suppressed`. The
/// live set is replaced wholesale on each successful refresh; a failed or
/// empty refresh leaves it untouched, so a flaky upstream degrades to a
/// stale-but-usable pool rather than an empty one.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    live: RwLock<Vec<String>>,
    suppressed: RwLock<HashSet<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] OpenRouterError),
    #[error("Fetched model list was empty")]
    EmptyListing,
}

impl ModelCatalog {
    /// Create an empty catalog with the given suppressed seed.
    pub fn new(suppressed: impl IntoIterator<Item = String>) -> Self {
        Self {
            live: RwLock::new(Vec::new()),
            suppressed: RwLock::new(suppressed.into_iter().collect()),
        }
    }

    /// Fetch the free-model listing and replace the live set.
    ///
    /// The previous live set survives every failure path, including a
    /// successful fetch that returns zero models. Returns the new live count.
    pub async fn refresh(&self, client: &OpenRouterClient) -> Result<usize, CatalogError> {
        let models = client.list_free_models().await?;
        if models.is_empty() {
            return Err(CatalogError::EmptyListing);
        }

        let count = models.len();
        *self.live.write().await = models;
        tracing::info!("Model list updated, {} models available", count);
        Ok(count)
    }

    /// Current candidate pool as a fresh copy, live order preserved.
    pub async fn candidates(&self) -> Vec<String> {
        let suppressed = self.suppressed.read().await;
        self.live
            .read()
            .await
            .iter()
            .filter(|m| !suppressed.contains(*m))
            .cloned()
            .collect()
    }

    /// Suppress a model id. Idempotent; returns whether the id was newly
    /// inserted.
    pub async fn suppress(&self, model_id: &str) -> bool {
        let inserted = self.suppressed.write().await.insert(model_id.to_string());
        if inserted {
            tracing::info!("Suppressed model {}", model_id);
        }
        inserted
    }

    /// Current suppressed set, sorted for a stable order.
    pub async fn suppressed(&self) -> Vec<String> {
        let mut list: Vec<String> = self.suppressed.read().await.iter().cloned().collect();
        list.sort();
        list
    }

    #[cfg(test)]
    pub async fn set_live(&self, models: Vec<String>) {
        *self.live.write().await = models;
    }
}
