//! HTTP and WebSocket API for the session graph

pub mod handlers;
pub mod routes;
pub mod ws_handlers;

pub use routes::create_router;
