//! WebSocket protocol types for server-client communication.
//!
//! This module defines the message format for streaming model answers
//! from the backend to connected browser clients.
//!
//! # Protocol Overview
//!
//! The protocol uses JSON-encoded messages over WebSocket. Each message has a
//! `type` field that determines its structure.
//!
//! ## Connection Flow
//!
//! 1. Client connects to the backend WebSocket endpoint
//! 2. Backend mints a session id and sends `Connected`
//! 3. Client submits a question over HTTP, tagged with its session id
//! 4. Backend sends `ModelsSelected` with the chosen models
//! 5. Backend sends one `Result` per model, in completion order
//! 6. Backend sends `Complete` once every model has settled
//!
//! ## Ping Mechanisms
//!
//! There are two ping mechanisms:
//! - **WebSocket ping/pong**: Transport-level keepalive, handled automatically
//! - **Application-level `Ping`**: Client JSON frame, answered with `Pong`

use serde::{Deserialize, Serialize};

/// Events sent from the server to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once, immediately after the connection is established.
    #[serde(rename_all = "camelCase")]
    Connected { session_id: String },
    /// The models chosen for a question, sent before any outbound call.
    ModelsSelected { models: Vec<String> },
    /// One model's settled outcome.
    Result { data: ModelOutcome },
    /// All models for the current question have settled.
    Complete,
    /// Reply to a client `Ping`.
    Pong,
}

/// Control messages sent from a client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Connection-health probe, answered with `ServerEvent::Pong`.
    Ping,
}

/// The outcome of querying a single model. Produced exactly once per model,
/// independent of its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    /// The model answered.
    Success { model: String, response: String },
    /// The call failed (non-2xx, transport error, timeout).
    Error { model: String, error: String },
}

impl ModelOutcome {
    /// The model this outcome belongs to.
    pub fn model(&self) -> &str {
        match self {
            ModelOutcome::Success { model, .. } => model,
            ModelOutcome::Error { model, .. } => model,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ModelOutcome::Success { .. })
    }
}
