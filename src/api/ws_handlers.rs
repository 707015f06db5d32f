//! WebSocket handler for real-time session view updates
//!
//! A client subscribes to one session. On connect it receives the current
//! view (if the session exists), then every event whose topic matches.

use super::handlers::SessionState;
use crate::error::SessionError;
use crate::events::{SessionEvent, SessionEventKind};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

/// WebSocket upgrade handler for `/ws/sessions/{name}`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    State(state): State<SessionState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state, name))
}

/// Only events for the subscribed session are forwarded
fn matches_topic(event: &SessionEvent, session: &str) -> bool {
    event.topic == session
}

/// Current view as a `view_updated` event, or `None` if the session is unknown
async fn initial_snapshot(state: &SessionState, session: &str) -> Option<SessionEvent> {
    match state.manager.get_session_view(session).await {
        Ok(rows) => match serde_json::to_value(&rows) {
            Ok(payload) => {
                Some(SessionEvent::new(session, SessionEventKind::ViewUpdated).with_payload(payload))
            }
            Err(e) => {
                warn!(session = %session, "Failed to serialize initial view: {}", e);
                None
            }
        },
        Err(SessionError::NotFound(_)) => None,
        Err(e) => {
            warn!(session = %session, "Failed to compose initial view: {}", e);
            None
        }
    }
}

/// Handle an individual WebSocket connection
async fn handle_ws(socket: WebSocket, state: SessionState, session: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    // Subscribe before composing so no update between the two is missed
    let mut event_rx = state.event_bus.subscribe();

    if let Some(snapshot) = initial_snapshot(&state, &session).await {
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    debug!("WebSocket send failed, client disconnected");
                    return;
                }
            }
            Err(e) => warn!("Failed to serialize SessionEvent: {}", e),
        }
    }

    // Ping interval (30s)
    let mut ping_interval = interval(Duration::from_secs(30));
    // Skip the first immediate tick
    ping_interval.tick().await;

    debug!(session = %session, "WebSocket session client connected");

    loop {
        tokio::select! {
            result = event_rx.recv() => {
                match result {
                    Ok(event) => {
                        if !matches_topic(&event, &session) {
                            continue;
                        }
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    debug!("WebSocket send failed, client disconnected");
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Failed to serialize SessionEvent: {}", e);
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, session = %session, "WebSocket client lagged, skipping events");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event bus closed, shutting down WebSocket");
                        break;
                    }
                }
            }

            // Send periodic pings to detect dead clients
            _ = ping_interval.tick() => {
                if ws_sender.send(Message::Ping(vec![].into())).await.is_err() {
                    debug!("Ping failed, client disconnected");
                    break;
                }
            }

            // Handle incoming messages from the client (Pong, Close)
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {
                        // Clients only listen
                    }
                }
            }
        }
    }

    debug!(session = %session, "WebSocket connection closed");
}
