//! Dispatch engine: fans one question out to a random subset of models and
//! streams each settled outcome back to the asking session.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::task::JoinHandle;

use hivemind_common::{ModelOutcome, ServerEvent};

use crate::catalog::ModelCatalog;
use crate::gateway::SessionRegistry;
use crate::llm::OpenRouterClient;

/// Substituted when the catalog pool is empty so a dispatch never
/// degenerates to zero candidates.
pub const FALLBACK_MODELS: [&str; 5] = [
    "google/gemma-3-12b-it",
    "deepseek/deepseek-r1-0528",
    "meta-llama/llama-3.3-70b-instruct",
    "qwen/qwen-2-vl-7b-instruct",
    "google/gemma-3-27b-it",
];

/// Errors surfaced to the submitting caller. Everything that happens after
/// acceptance settles into streamed `result` events instead.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Question is required and must be a non-empty string")]
    EmptyQuestion,
    #[error("Session ID is required and must be a non-empty string")]
    EmptySessionId,
    #[error("OpenRouter API key not configured. Please set OPENROUTER_API_KEY.")]
    MissingApiKey,
}

/// Immediate acknowledgment of an accepted question.
///
/// `job` is the handle of the background fan-out: the selected calls plus the
/// final `complete` push. Nothing in the server awaits it, but tests do.
#[derive(Debug)]
pub struct DispatchReceipt {
    pub session_id: String,
    pub models: Vec<String>,
    pub job: JoinHandle<()>,
}

/// Fans questions out across models and routes outcomes to sessions.
pub struct DispatchEngine {
    catalog: Arc<ModelCatalog>,
    registry: Arc<SessionRegistry>,
    client: Arc<OpenRouterClient>,
    max_models: usize,
}

impl DispatchEngine {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        registry: Arc<SessionRegistry>,
        client: Arc<OpenRouterClient>,
        max_models: usize,
    ) -> Self {
        Self {
            catalog,
            registry,
            client,
            max_models,
        }
    }

    /// Accept a question for a session and start the fan-out.
    ///
    /// Synchronously validates, selects models, and pushes `models_selected`;
    /// the outbound calls and the `complete` push continue in the returned
    /// receipt's background job. A session that disappears mid-job only makes
    /// the remaining pushes no-ops.
    pub async fn handle_question(
        &self,
        question: &str,
        session_id: &str,
    ) -> Result<DispatchReceipt, DispatchError> {
        if question.trim().is_empty() {
            return Err(DispatchError::EmptyQuestion);
        }
        if session_id.trim().is_empty() {
            return Err(DispatchError::EmptySessionId);
        }
        if !self.client.has_api_key() {
            return Err(DispatchError::MissingApiKey);
        }

        let models = self.select_models().await;
        tracing::info!(
            session_id = %session_id,
            model_count = models.len(),
            "Dispatching question"
        );

        // Selected-models notice goes out before any call is issued so the
        // client can render pending placeholders.
        self.registry
            .push(
                session_id,
                ServerEvent::ModelsSelected {
                    models: models.clone(),
                },
            )
            .await;

        let job = self.spawn_fanout(question, session_id, models.clone());

        Ok(DispatchReceipt {
            session_id: session_id.to_string(),
            models,
            job,
        })
    }

    /// Pick `min(max_models, pool)` models without replacement, uniformly at
    /// random (Fisher-Yates shuffle, then truncate).
    async fn select_models(&self) -> Vec<String> {
        let mut pool = self.catalog.candidates().await;
        if pool.is_empty() {
            tracing::warn!("No models in catalog, using fallback list");
            pool = FALLBACK_MODELS.iter().map(|m| m.to_string()).collect();
        }

        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(self.max_models);
        pool
    }

    /// Spawn one independent call per model. Each call settles into exactly
    /// one pushed `result`; after all have settled, one `complete` follows.
    fn spawn_fanout(
        &self,
        question: &str,
        session_id: &str,
        models: Vec<String>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let client = Arc::clone(&self.client);
        let question: Arc<str> = Arc::from(question);
        let session_id = session_id.to_string();

        tokio::spawn(async move {
            let calls: Vec<JoinHandle<()>> = models
                .into_iter()
                .map(|model| {
                    let registry = Arc::clone(&registry);
                    let client = Arc::clone(&client);
                    let question = Arc::clone(&question);
                    let session_id = session_id.clone();

                    tokio::spawn(async move {
                        let outcome = match client.ask(&model, &question).await {
                            Ok(response) => ModelOutcome::Success { model, response },
                            Err(e) => {
                                tracing::debug!("Model call failed: {}", e);
                                ModelOutcome::Error {
                                    model,
                                    error: e.to_string(),
                                }
                            }
                        };
                        registry
                            .push(&session_id, ServerEvent::Result { data: outcome })
                            .await;
                    })
                })
                .collect();

            futures_util::future::join_all(calls).await;

            registry.push(&session_id, ServerEvent::Complete).await;
            tracing::debug!(session_id = %session_id, "Dispatch job complete");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use rstest::rstest;
    use tokio::sync::mpsc;

    /// Engine whose upstream is a closed port: every model call settles
    /// quickly as an error, which is all the selection and event-flow tests
    /// need.
    fn dead_upstream_engine(catalog: ModelCatalog, max_models: usize) -> DispatchEngine {
        let client = OpenRouterClient::new(
            "http://127.0.0.1:1",
            Some("test-key".to_string()),
            Duration::from_secs(1),
            "http://localhost:3000",
        );
        DispatchEngine::new(
            Arc::new(catalog),
            Arc::new(SessionRegistry::new()),
            Arc::new(client),
            max_models,
        )
    }

    async fn seeded_catalog(count: usize) -> ModelCatalog {
        let catalog = ModelCatalog::new([]);
        catalog
            .set_live((0..count).map(|i| format!("vendor/model-{i}")).collect())
            .await;
        catalog
    }

    async fn open_session(engine: &DispatchEngine) -> (String, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let session_id = uuid::Uuid::new_v4().to_string();
        engine.registry.register(session_id.clone(), tx).await;
        (session_id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn test_blank_question_rejected(#[case] question: &str) {
        let engine = dead_upstream_engine(seeded_catalog(3).await, 15);
        let result = engine.handle_question(question, "session-1").await;
        assert!(matches!(result, Err(DispatchError::EmptyQuestion)));
    }

    #[rstest]
    #[case("")]
    #[case("  ")]
    #[tokio::test]
    async fn test_blank_session_id_rejected(#[case] session_id: &str) {
        let engine = dead_upstream_engine(seeded_catalog(3).await, 15);
        let result = engine.handle_question("why?", session_id).await;
        assert!(matches!(result, Err(DispatchError::EmptySessionId)));
    }

    #[tokio::test]
    async fn test_missing_api_key_rejected_before_dispatch() {
        let client = OpenRouterClient::new(
            "http://127.0.0.1:1",
            None,
            Duration::from_secs(1),
            "http://localhost:3000",
        );
        let engine = DispatchEngine::new(
            Arc::new(seeded_catalog(3).await),
            Arc::new(SessionRegistry::new()),
            Arc::new(client),
            15,
        );
        let (session_id, mut rx) = open_session(&engine).await;

        let result = engine.handle_question("why?", &session_id).await;
        assert!(matches!(result, Err(DispatchError::MissingApiKey)));
        // Nothing streamed: the credential gate fires before any push.
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_selection_is_capped_and_duplicate_free() {
        let engine = dead_upstream_engine(seeded_catalog(40).await, 15);
        let (session_id, _rx) = open_session(&engine).await;

        let receipt = engine.handle_question("why?", &session_id).await.unwrap();
        assert_eq!(receipt.models.len(), 15);

        let unique: HashSet<&String> = receipt.models.iter().collect();
        assert_eq!(unique.len(), 15);

        let pool: HashSet<String> = engine.catalog.candidates().await.into_iter().collect();
        assert!(receipt.models.iter().all(|m| pool.contains(m)));

        receipt.job.await.unwrap();
    }

    #[tokio::test]
    async fn test_small_pool_uses_every_model() {
        let engine = dead_upstream_engine(seeded_catalog(5).await, 15);
        let (session_id, _rx) = open_session(&engine).await;

        let receipt = engine.handle_question("why?", &session_id).await.unwrap();
        let selected: HashSet<String> = receipt.models.iter().cloned().collect();
        let pool: HashSet<String> = engine.catalog.candidates().await.into_iter().collect();
        assert_eq!(selected, pool);

        receipt.job.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_pool_falls_back_to_fixed_list() {
        let engine = dead_upstream_engine(ModelCatalog::new([]), 15);
        let (session_id, _rx) = open_session(&engine).await;

        let receipt = engine.handle_question("why?", &session_id).await.unwrap();
        assert_eq!(receipt.models.len(), FALLBACK_MODELS.len());
        let fallback: HashSet<&str> = FALLBACK_MODELS.into_iter().collect();
        assert!(receipt.models.iter().all(|m| fallback.contains(m.as_str())));

        receipt.job.await.unwrap();
    }

    #[tokio::test]
    async fn test_event_stream_shape() {
        let engine = dead_upstream_engine(seeded_catalog(4).await, 3);
        let (session_id, mut rx) = open_session(&engine).await;

        let receipt = engine.handle_question("why?", &session_id).await.unwrap();
        let selected = receipt.models.clone();
        receipt.job.await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), selected.len() + 2);

        assert!(
            matches!(&events[0], ServerEvent::ModelsSelected { models } if *models == selected)
        );
        assert!(matches!(events.last(), Some(ServerEvent::Complete)));

        let mut reported: Vec<String> = events[1..events.len() - 1]
            .iter()
            .map(|e| match e {
                ServerEvent::Result { data } => data.model().to_string(),
                other => panic!("Expected result event, got {other:?}"),
            })
            .collect();
        reported.sort();
        let mut expected = selected.clone();
        expected.sort();
        assert_eq!(reported, expected);
    }

    #[tokio::test]
    async fn test_suppressed_models_never_selected() {
        let catalog = seeded_catalog(10).await;
        catalog.suppress("vendor/model-3").await;
        catalog.suppress("vendor/model-7").await;
        let engine = dead_upstream_engine(catalog, 10);
        let (session_id, _rx) = open_session(&engine).await;

        let receipt = engine.handle_question("why?", &session_id).await.unwrap();
        assert_eq!(receipt.models.len(), 8);
        assert!(!receipt.models.contains(&"vendor/model-3".to_string()));
        assert!(!receipt.models.contains(&"vendor/model-7".to_string()));

        receipt.job.await.unwrap();
    }

    #[tokio::test]
    async fn test_job_survives_session_disconnect() {
        let engine = dead_upstream_engine(seeded_catalog(3).await, 3);
        let (session_id, rx) = open_session(&engine).await;

        let receipt = engine.handle_question("why?", &session_id).await.unwrap();

        // Client goes away right after models_selected.
        drop(rx);
        engine.registry.unregister(&session_id).await;

        receipt.job.await.unwrap();
        assert!(!engine.registry.push(&session_id, ServerEvent::Complete).await);
    }

    #[tokio::test]
    async fn test_dispatch_to_unknown_session_still_accepted() {
        let engine = dead_upstream_engine(seeded_catalog(3).await, 3);

        // Valid id that was never registered: pushes all no-op, but the
        // submission itself succeeds.
        let receipt = engine.handle_question("why?", "ghost-session").await.unwrap();
        assert_eq!(receipt.models.len(), 3);
        receipt.job.await.unwrap();
    }
}
