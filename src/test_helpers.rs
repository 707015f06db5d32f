//! Test helper factories and mock state builders
//!
//! Provides convenience functions for creating test objects with sensible defaults,
//! and a builder for a mock API state backed by in-memory stores.
#![allow(dead_code)]

use crate::api::handlers::{ServerState, SessionState};
use crate::events::EventBus;
use crate::holdings::mock::MockHoldingsProvider;
use crate::holdings::RawAddressPayload;
use crate::neo4j::mock::MockGraphStore;
use crate::neo4j::models::*;
use crate::session::{SessionGraphManager, SessionSettings};
use crate::social::mock::MockSocialClient;
use serde_json::{Map, Value};
use std::sync::Arc;

// ============================================================================
// Mock state builders
// ============================================================================

/// API state over `store` with empty social and holdings mocks
pub fn mock_server_state(store: MockGraphStore) -> SessionState {
    mock_server_state_with(store, MockSocialClient::new(), MockHoldingsProvider::new())
}

/// API state over the given mocks, with the manager broadcasting on the bus
pub fn mock_server_state_with(
    store: MockGraphStore,
    social: MockSocialClient,
    holdings: MockHoldingsProvider,
) -> SessionState {
    let event_bus = Arc::new(EventBus::default());
    let manager = SessionGraphManager::new(
        Arc::new(store),
        Arc::new(social),
        Arc::new(holdings),
        SessionSettings::default(),
    )
    .with_event_emitter(event_bus.clone());

    Arc::new(ServerState {
        manager: Arc::new(manager),
        event_bus,
    })
}

// ============================================================================
// Model factories
// ============================================================================

/// Profile with `screen_name` and display name both set to `name`
pub fn test_profile(id: &str, name: &str) -> ActorProfile {
    ActorProfile {
        id: id.to_string(),
        screen_name: name.to_string(),
        name: name.to_string(),
        description: String::new(),
        profile_image_url: String::new(),
        created_at: String::new(),
        verified: false,
        followers_count: 0,
        friends_count: 0,
    }
}

/// Stored actor refreshed at `last_updated` (unix seconds)
pub fn actor_node(id: &str, screen_name: &str, last_updated: i64) -> ActorNode {
    ActorNode {
        profile: test_profile(id, screen_name),
        last_updated,
        last_updated_local: String::new(),
    }
}

/// View node with only its key property set
pub fn graph_node(label: NodeLabel, key: &str) -> GraphNode {
    let mut properties = Map::new();
    properties.insert(label.key_field().to_string(), Value::String(key.to_string()));
    GraphNode {
        label,
        key: key.to_string(),
        properties,
    }
}

/// Holdings payload for `address`, with sub-arrays taken from `extras`
/// (camelCase keys, e.g. `{"tokens": [...], "polygonNfts": [...]}`)
pub fn address_payload(address: &str, extras: Value) -> RawAddressPayload {
    let mut object = match extras {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    object.insert("address".to_string(), Value::String(address.to_string()));
    serde_json::from_value(Value::Object(object)).unwrap()
}
