//! Session event types for WebSocket notifications

use serde::{Deserialize, Serialize};

/// What happened to the session graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// Full recomputed session view
    ViewUpdated,
    /// Rows contributed by a participant that just joined
    ParticipantJoined,
}

/// An event emitted after a successful mutation
///
/// Sent to WebSocket clients subscribed to `topic` (the session name).
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Unique event id
    pub id: String,
    /// Topic key: the session name
    pub topic: String,
    pub kind: SessionEventKind,
    /// View rows, verbatim
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl SessionEvent {
    /// Create a new SessionEvent with the current timestamp
    pub fn new(topic: impl Into<String>, kind: SessionEventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.into(),
            kind,
            payload: serde_json::Value::Null,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Broadcast capability handed to the change notifier.
///
/// Fire-and-forget: implementations must never block or fail the caller.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: SessionEvent);
}
