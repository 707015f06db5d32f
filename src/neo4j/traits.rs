//! GraphStore trait definition
//!
//! Defines the abstract interface for all graph operations used by the
//! session layer. `Neo4jClient` is the production implementation; the
//! in-memory `MockGraphStore` backs the unit tests.
//!
//! Every write method is one atomic unit of work: it either commits in full
//! or leaves no trace in the store.

use crate::neo4j::models::*;
use anyhow::Result;
use async_trait::async_trait;

/// Abstract interface for all graph database operations.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========================================================================
    // Session operations
    // ========================================================================

    /// Merge a session by name. Returns true if it was created by this call.
    async fn ensure_session(&self, name: &str) -> Result<bool>;

    /// Get a session by name
    async fn get_session(&self, name: &str) -> Result<Option<SessionNode>>;

    /// Merge the session and a `HAS_PARTICIPANT` edge to the Person (by `id`)
    /// or Address (by `address`) identified by `participant_id`.
    ///
    /// Returns the participant's label, or `None` if no such node exists
    /// (in which case no edge is written).
    async fn add_participant(&self, session: &str, participant_id: &str)
        -> Result<Option<NodeLabel>>;

    /// Every participant of a session with its outgoing
    /// FOLLOWS / HOLDS / ATTENDED / HOLDS_ON_POLYGON neighbors
    async fn get_session_neighborhoods(&self, session: &str)
        -> Result<Vec<ParticipantNeighborhood>>;

    /// Names of all sessions that have any of the given participants
    async fn list_participant_sessions(&self, participant_ids: &[String]) -> Result<Vec<String>>;

    // ========================================================================
    // Actor operations
    // ========================================================================

    /// Get an actor by its external id
    async fn get_actor(&self, id: &str) -> Result<Option<ActorNode>>;

    /// Get an actor by screen name (expects an already lowercased name)
    async fn get_actor_by_screen_name(&self, screen_name: &str) -> Result<Option<ActorNode>>;

    /// Merge actors on `id` and overwrite their mutable fields, in one transaction.
    ///
    /// `last_updated` is stored as the max of the existing and given value.
    async fn upsert_actors(&self, actors: &[ActorProfile], stamp: &Stamp) -> Result<()>;

    /// Merge `FOLLOWS` in both directions between the actor and every
    /// existing counterpart, in one transaction. Missing endpoints are skipped.
    ///
    /// Returns the number of counterparts that were linked.
    async fn merge_follows(&self, actor_id: &str, counterpart_ids: &[String]) -> Result<usize>;

    // ========================================================================
    // Address operations
    // ========================================================================

    /// Merge an address, its held entities and the typed relationships
    /// between them in one transaction. Held-entity attributes are only set
    /// on create.
    async fn ingest_address(&self, unit: &AddressIngest, stamp: &Stamp) -> Result<()>;

    /// Get an address node
    async fn get_address(&self, address: &str) -> Result<Option<AddressNode>>;

    /// Get a held entity by kind and natural key
    async fn get_held_entity(
        &self,
        kind: HeldEntityKind,
        natural_key: &str,
    ) -> Result<Option<HeldEntityNode>>;

    // ========================================================================
    // Audit log
    // ========================================================================

    /// Append a `SearchQuery` node
    async fn record_search_query(&self, entry: &SearchQueryEntry) -> Result<()>;

    /// Append a `SearchAddress` node
    async fn record_address_search(&self, entry: &SearchAddressEntry) -> Result<()>;

    // ========================================================================
    // Health
    // ========================================================================

    /// Check connectivity to the store
    async fn health_check(&self) -> Result<bool>;
}
