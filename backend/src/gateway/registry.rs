//! Session registry for tracking connected clients.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};

use hivemind_common::ServerEvent;

/// A connected client session.
#[derive(Debug, Clone)]
pub struct ConnectedSession {
    /// Opaque session identifier, unique for the process lifetime.
    pub id: String,
    /// When the client connected.
    pub connected_at: DateTime<Utc>,
    /// Channel to the task that owns the client's socket.
    pub tx: mpsc::Sender<ServerEvent>,
}

/// Registry of connected client sessions.
///
/// Shared by every connection and every concurrent dispatch job. Sessions are
/// owned here exclusively; dispatch jobs address them by id on every push and
/// never hold a handle across calls, so a session that disappears mid-job
/// turns later pushes into no-ops.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, ConnectedSession>>,
}

impl SessionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session. Overwrites any previous entry for the same id.
    pub async fn register(&self, id: String, tx: mpsc::Sender<ServerEvent>) {
        let session = ConnectedSession {
            id: id.clone(),
            connected_at: Utc::now(),
            tx,
        };
        self.sessions.write().await.insert(id, session);
    }

    /// Remove a session. Called on disconnect, send failure, or shutdown.
    pub async fn unregister(&self, id: &str) -> Option<ConnectedSession> {
        self.sessions.write().await.remove(id)
    }

    /// Best-effort delivery of an event to a session.
    ///
    /// Returns `false` when the session is unknown, its connection task has
    /// gone away, or its channel is full. The send never waits, so a slow
    /// peer cannot stall the caller.
    pub async fn push(&self, id: &str, event: ServerEvent) -> bool {
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(id) else {
            return false;
        };

        match session.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Dropping event for session {}: channel full", id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Get a session by id.
    pub async fn get(&self, id: &str) -> Option<ConnectedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Count connected sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
