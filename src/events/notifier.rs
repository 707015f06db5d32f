//! Change notifier: recompose a session view and broadcast it
//!
//! Runs after a mutation has committed. Nothing here can fail the caller:
//! compose errors are logged and the broadcast is fire-and-forget.

use super::types::{EventEmitter, SessionEvent, SessionEventKind};
use crate::neo4j::models::ViewRow;
use crate::neo4j::GraphStore;
use crate::session::view::SessionViewComposer;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ChangeNotifier {
    store: Arc<dyn GraphStore>,
    composer: SessionViewComposer,
    emitter: Arc<dyn EventEmitter>,
}

impl ChangeNotifier {
    pub fn new(store: Arc<dyn GraphStore>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            composer: SessionViewComposer::new(store.clone()),
            store,
            emitter,
        }
    }

    fn emit_rows(&self, session: &str, kind: SessionEventKind, rows: &[ViewRow]) {
        match serde_json::to_value(rows) {
            Ok(payload) => self
                .emitter
                .emit(SessionEvent::new(session, kind).with_payload(payload)),
            Err(e) => warn!(session = %session, "Failed to serialize session view: {}", e),
        }
    }

    /// Broadcast the full recomputed view of `session`
    pub async fn session_changed(&self, session: &str) {
        match self.composer.compose(session).await {
            Ok(rows) => {
                debug!(session = %session, rows = rows.len(), "Broadcasting session view");
                self.emit_rows(session, SessionEventKind::ViewUpdated, &rows);
            }
            Err(e) => warn!(session = %session, "Failed to recompose session view: {}", e),
        }
    }

    /// Broadcast the rows a new participant contributes, then the full view
    pub async fn participant_joined(&self, session: &str, participant_id: &str) {
        match self.composer.compose(session).await {
            Ok(rows) => {
                let delta: Vec<ViewRow> = rows
                    .iter()
                    .filter(|row| row.participant.key == participant_id)
                    .cloned()
                    .collect();
                self.emit_rows(session, SessionEventKind::ParticipantJoined, &delta);
                self.emit_rows(session, SessionEventKind::ViewUpdated, &rows);
            }
            Err(e) => warn!(
                session = %session,
                participant = %participant_id,
                "Failed to recompose session view: {}",
                e
            ),
        }
    }

    /// Broadcast to every session that has any of the given participants
    pub async fn participants_changed(&self, participant_ids: &[String]) {
        let sessions = match self.store.list_participant_sessions(participant_ids).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Failed to list sessions for changed participants: {}", e);
                return;
            }
        };
        for session in sessions {
            self.session_changed(&session).await;
        }
    }
}
