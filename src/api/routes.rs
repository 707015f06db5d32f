//! API route definitions

use super::handlers::{self, SessionState};
use super::ws_handlers;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: SessionState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Sessions
        // ====================================================================
        .route(
            "/api/sessions/{name}",
            get(handlers::get_session_view).put(handlers::ensure_session),
        )
        .route(
            "/api/sessions/{name}/end-date",
            get(handlers::get_session_end_date),
        )
        .route(
            "/api/sessions/{name}/participants",
            post(handlers::add_participant),
        )
        .route(
            "/api/sessions/{name}/participants/{id}/view",
            get(handlers::get_participant_view),
        )
        .route(
            "/api/sessions/{name}/actors/{handle}",
            post(handlers::refresh_actor),
        )
        .route(
            "/api/sessions/{name}/addresses/{address}",
            post(handlers::refresh_address),
        )
        // ====================================================================
        // Addresses
        // ====================================================================
        .route("/api/addresses", post(handlers::ingest_address))
        .route(
            "/api/searches/addresses",
            post(handlers::log_address_search),
        )
        // ====================================================================
        // Actors
        // ====================================================================
        .route("/api/actors", put(handlers::upsert_actor))
        .route("/api/actors/{handle}/fresh", get(handlers::is_actor_fresh))
        .route("/api/actors/{id}/follows", post(handlers::add_follows))
        .route(
            "/api/actors/{handle}/common",
            get(handlers::common_connections),
        )
        // ====================================================================
        // WebSocket
        // ====================================================================
        .route("/ws/sessions/{name}", get(ws_handlers::ws_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
