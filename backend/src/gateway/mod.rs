//! Gateway module for managing client sessions.
//!
//! This module provides:
//! - WebSocket handler for client connections
//! - Session registry mapping session ids to live connections
//! - Best-effort event push used by the dispatch engine

mod registry;
mod ws;

pub use registry::{ConnectedSession, SessionRegistry};
pub use ws::ws_handler;
