//! Session event system for real-time WebSocket notifications
//!
//! This module provides:
//! - `SessionEvent`: typed events carrying a recomputed view, keyed by session
//! - `EventEmitter`: the broadcast capability
//! - `EventBus`: broadcast channel for distributing events to WebSocket clients
//! - `ChangeNotifier`: recomposes a session view after a mutation and emits it

mod bus;
mod notifier;
mod types;

pub use bus::EventBus;
pub use notifier::ChangeNotifier;
pub use types::{EventEmitter, SessionEvent, SessionEventKind};
