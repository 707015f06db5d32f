//! API request handlers

use crate::error::SessionError;
use crate::events::EventBus;
use crate::holdings::RawAddressPayload;
use crate::neo4j::models::{ActorProfile, NodeLabel, ViewRow};
use crate::session::{ActorRefresh, AddressRefresh, SessionGraphManager};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub manager: Arc<SessionGraphManager>,
    /// Broadcast bus the manager emits session events on
    pub event_bus: Arc<EventBus>,
}

pub type SessionState = Arc<ServerState>;

// ============================================================================
// Health check
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub neo4j: String,
}

/// Returns 200 when the graph store answers, 503 otherwise.
pub async fn health(State(state): State<SessionState>) -> (StatusCode, Json<HealthResponse>) {
    let neo4j_ok = state.manager.health_check().await;

    let (http_status, status, neo4j) = if neo4j_ok {
        (StatusCode::OK, "ok", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            neo4j: neo4j.to_string(),
        }),
    )
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct EnsureSessionResponse {
    pub name: String,
    pub created: bool,
}

/// Create a session if absent (201 when created, 200 otherwise)
pub async fn ensure_session(
    State(state): State<SessionState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<EnsureSessionResponse>), AppError> {
    let created = state.manager.ensure_session(&name).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(EnsureSessionResponse { name, created })))
}

/// Full pairwise view of a session
pub async fn get_session_view(
    State(state): State<SessionState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ViewRow>>, AppError> {
    Ok(Json(state.manager.get_session_view(&name).await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndDateResponse {
    pub name: String,
    pub end_date: Option<String>,
}

pub async fn get_session_end_date(
    State(state): State<SessionState>,
    Path(name): Path<String>,
) -> Result<Json<EndDateResponse>, AppError> {
    let end_date = state.manager.get_session_end_date(&name).await?;
    Ok(Json(EndDateResponse { name, end_date }))
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    pub participant_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddParticipantResponse {
    pub session: String,
    pub participant_id: String,
    pub label: NodeLabel,
}

pub async fn add_participant(
    State(state): State<SessionState>,
    Path(name): Path<String>,
    Json(req): Json<AddParticipantRequest>,
) -> Result<Json<AddParticipantResponse>, AppError> {
    let label = state
        .manager
        .add_participant(&req.participant_id, &name)
        .await?;
    Ok(Json(AddParticipantResponse {
        session: name,
        participant_id: req.participant_id,
        label,
    }))
}

/// Rows of the session view whose first participant is `id`
pub async fn get_participant_view(
    State(state): State<SessionState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<Vec<ViewRow>>, AppError> {
    Ok(Json(state.manager.get_participant_view(&name, &id).await?))
}

/// Refresh an actor from the social graph and add it to the session
pub async fn refresh_actor(
    State(state): State<SessionState>,
    Path((name, handle)): Path<(String, String)>,
) -> Result<Json<ActorRefresh>, AppError> {
    Ok(Json(state.manager.refresh_actor(&handle, &name).await?))
}

/// Refresh an address from the holdings provider and add it to the session
pub async fn refresh_address(
    State(state): State<SessionState>,
    Path((name, address)): Path<(String, String)>,
) -> Result<Json<AddressRefresh>, AppError> {
    Ok(Json(state.manager.refresh_address(&address, &name).await?))
}

// ============================================================================
// Addresses
// ============================================================================

pub async fn ingest_address(
    State(state): State<SessionState>,
    Json(payload): Json<RawAddressPayload>,
) -> Result<Json<AddressRefresh>, AppError> {
    let entities = state.manager.ingest_address_entities(&payload).await?;
    Ok(Json(AddressRefresh {
        address: payload.address,
        entities,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddressSearchRequest {
    pub address: String,
    #[serde(default)]
    pub screen_name: String,
}

pub async fn log_address_search(
    State(state): State<SessionState>,
    Json(req): Json<AddressSearchRequest>,
) -> Result<StatusCode, AppError> {
    state
        .manager
        .log_address_search(&req.address, &req.screen_name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Actors
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct FreshnessResponse {
    pub handle: String,
    pub fresh: bool,
}

pub async fn is_actor_fresh(
    State(state): State<SessionState>,
    Path(handle): Path<String>,
) -> Result<Json<FreshnessResponse>, AppError> {
    let fresh = state.manager.is_actor_fresh(&handle).await?;
    Ok(Json(FreshnessResponse { handle, fresh }))
}

pub async fn upsert_actor(
    State(state): State<SessionState>,
    Json(profile): Json<ActorProfile>,
) -> Result<StatusCode, AppError> {
    state.manager.upsert_actor(profile).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct FollowsRequest {
    pub counterpart_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowsResponse {
    pub actor_id: String,
    pub linked: usize,
}

pub async fn add_follows(
    State(state): State<SessionState>,
    Path(id): Path<String>,
    Json(req): Json<FollowsRequest>,
) -> Result<Json<FollowsResponse>, AppError> {
    let linked = state
        .manager
        .add_follows_edges(&id, &req.counterpart_ids)
        .await?;
    Ok(Json(FollowsResponse {
        actor_id: id,
        linked,
    }))
}

pub async fn common_connections(
    State(state): State<SessionState>,
    Path(handle): Path<String>,
) -> Result<Json<Vec<ActorProfile>>, AppError> {
    Ok(Json(state.manager.resolve_common_connections(&handle).await?))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::Validation(_) => AppError::BadRequest(err.to_string()),
            SessionError::Upstream(_) => AppError::BadGateway(err.to_string()),
            SessionError::Transaction(e) => AppError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use crate::neo4j::mock::MockGraphStore;
    use crate::neo4j::models::SessionNode;
    use crate::test_helpers::{actor_node, mock_server_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    async fn send(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[test]
    fn test_session_error_status_mapping() {
        let cases = [
            (SessionError::not_found("session x"), StatusCode::NOT_FOUND),
            (SessionError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                SessionError::Upstream(anyhow::anyhow!("429")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                SessionError::Transaction(anyhow::anyhow!("rolled back")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let resp = AppError::from(err).into_response();
            assert_eq!(resp.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_health_ok_with_mock_store() {
        let app = create_router(mock_server_state(MockGraphStore::new()));
        let (status, body) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["neo4j"], "connected");
    }

    #[tokio::test]
    async fn test_ensure_session_created_then_ok() {
        let state = mock_server_state(MockGraphStore::new());

        let (status, body) = send(create_router(state.clone()), "PUT", "/api/sessions/demo", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["created"], true);

        let (status, body) = send(create_router(state), "PUT", "/api/sessions/demo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["created"], false);
    }

    #[tokio::test]
    async fn test_unknown_session_view_is_404() {
        let app = create_router(mock_server_state(MockGraphStore::new()));
        let (status, body) = send(app, "GET", "/api/sessions/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_end_date_endpoint() {
        let store = MockGraphStore::new()
            .with_session(SessionNode {
                name: "demo".into(),
                end_date: Some("2024-06-01".into()),
            })
            .await;
        let app = create_router(mock_server_state(store));
        let (status, body) = send(app, "GET", "/api/sessions/demo/end-date", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["end_date"], "2024-06-01");
    }

    #[tokio::test]
    async fn test_participants_and_view_flow() {
        let store = MockGraphStore::new()
            .with_actor(actor_node("1", "one", 0))
            .await
            .with_actor(actor_node("2", "two", 0))
            .await;
        let state = mock_server_state(store);

        for id in ["1", "2"] {
            let (status, body) = send(
                create_router(state.clone()),
                "POST",
                "/api/sessions/demo/participants",
                Some(json!({"participant_id": id})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["label"], "Person");
        }

        let (status, body) = send(create_router(state.clone()), "GET", "/api/sessions/demo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = send(
            create_router(state.clone()),
            "GET",
            "/api/sessions/demo/participants/2/view",
            None,
        )
        .await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["participant"]["key"], "2");
        assert!(rows[0]["common"].is_null());

        let (status, _) = send(
            create_router(state),
            "POST",
            "/api/sessions/demo/participants",
            Some(json!({"participant_id": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_actor_endpoints() {
        let state = mock_server_state(MockGraphStore::new());

        for (id, name) in [("1", "Alice"), ("2", "Bob")] {
            let (status, _) = send(
                create_router(state.clone()),
                "PUT",
                "/api/actors",
                Some(json!({"id": id, "screen_name": name, "name": name})),
            )
            .await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let (status, body) = send(
            create_router(state.clone()),
            "POST",
            "/api/actors/1/follows",
            Some(json!({"counterpart_ids": ["2"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["linked"], 1);

        let (status, body) = send(create_router(state.clone()), "GET", "/api/actors/ALICE/fresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fresh"], true);

        let (status, _) = send(
            create_router(state),
            "PUT",
            "/api/actors",
            Some(json!({"id": "", "screen_name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingest_address_and_search_log() {
        let state = mock_server_state(MockGraphStore::new());

        let (status, body) = send(
            create_router(state.clone()),
            "POST",
            "/api/addresses",
            Some(json!({
                "address": "0xabc",
                "tokens": [{"symbol": "X", "tokenCount": 1}],
                "events": [{"name": "no id"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entities"], 1);

        let (status, _) = send(
            create_router(state),
            "POST",
            "/api/searches/addresses",
            Some(json!({"address": "0xabc", "screen_name": "alice"})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_refresh_actor_upstream_failure_is_502() {
        let app = create_router(mock_server_state(MockGraphStore::new()));
        let (status, _) = send(app, "POST", "/api/sessions/demo/actors/nobody", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
