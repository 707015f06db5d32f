//! `GraphStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;

use super::client::Neo4jClient;
use super::models::*;
use super::traits::GraphStore;

#[async_trait]
impl GraphStore for Neo4jClient {
    // ========================================================================
    // Session operations
    // ========================================================================

    async fn ensure_session(&self, name: &str) -> anyhow::Result<bool> {
        self.ensure_session(name).await
    }

    async fn get_session(&self, name: &str) -> anyhow::Result<Option<SessionNode>> {
        self.get_session(name).await
    }

    async fn add_participant(
        &self,
        session: &str,
        participant_id: &str,
    ) -> anyhow::Result<Option<NodeLabel>> {
        self.add_participant(session, participant_id).await
    }

    async fn get_session_neighborhoods(
        &self,
        session: &str,
    ) -> anyhow::Result<Vec<ParticipantNeighborhood>> {
        self.get_session_neighborhoods(session).await
    }

    async fn list_participant_sessions(
        &self,
        participant_ids: &[String],
    ) -> anyhow::Result<Vec<String>> {
        self.list_participant_sessions(participant_ids).await
    }

    // ========================================================================
    // Actor operations
    // ========================================================================

    async fn get_actor(&self, id: &str) -> anyhow::Result<Option<ActorNode>> {
        self.get_actor(id).await
    }

    async fn get_actor_by_screen_name(
        &self,
        screen_name: &str,
    ) -> anyhow::Result<Option<ActorNode>> {
        self.get_actor_by_screen_name(screen_name).await
    }

    async fn upsert_actors(&self, actors: &[ActorProfile], stamp: &Stamp) -> anyhow::Result<()> {
        self.upsert_actors(actors, stamp).await
    }

    async fn merge_follows(
        &self,
        actor_id: &str,
        counterpart_ids: &[String],
    ) -> anyhow::Result<usize> {
        self.merge_follows(actor_id, counterpart_ids).await
    }

    // ========================================================================
    // Address operations
    // ========================================================================

    async fn ingest_address(&self, unit: &AddressIngest, stamp: &Stamp) -> anyhow::Result<()> {
        self.ingest_address(unit, stamp).await
    }

    async fn get_address(&self, address: &str) -> anyhow::Result<Option<AddressNode>> {
        self.get_address(address).await
    }

    async fn get_held_entity(
        &self,
        kind: HeldEntityKind,
        natural_key: &str,
    ) -> anyhow::Result<Option<HeldEntityNode>> {
        self.get_held_entity(kind, natural_key).await
    }

    // ========================================================================
    // Audit log
    // ========================================================================

    async fn record_search_query(&self, entry: &SearchQueryEntry) -> anyhow::Result<()> {
        self.record_search_query(entry).await
    }

    async fn record_address_search(&self, entry: &SearchAddressEntry) -> anyhow::Result<()> {
        self.record_address_search(entry).await
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        self.health_check().await
    }
}
