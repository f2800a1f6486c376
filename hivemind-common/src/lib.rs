//! Hivemind Common Types
//!
//! Shared types used by the backend and by anything that speaks its
//! WebSocket protocol.

pub mod protocol;

pub use protocol::{ClientMessage, ModelOutcome, ServerEvent};
