//! In-memory mock implementation of GraphStore for testing.
//!
//! Provides a complete mock of all graph operations using
//! `tokio::sync::RwLock` collections, with the same merge, rollback and
//! skip-missing-endpoint semantics as the Cypher in `client.rs`.
//! Conditionally compiled with `#[cfg(test)]`.

use crate::neo4j::models::*;
use crate::neo4j::traits::GraphStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// In-memory mock implementation of GraphStore for testing.
pub struct MockGraphStore {
    // Node stores
    pub sessions: RwLock<HashMap<String, SessionNode>>,
    pub actors: RwLock<HashMap<String, ActorNode>>,
    pub addresses: RwLock<HashMap<String, AddressNode>>,
    pub held_entities: RwLock<HashMap<(HeldEntityKind, String), HeldEntityNode>>,

    // Relationships
    pub follows: RwLock<HashSet<(String, String)>>,
    pub address_links: RwLock<Vec<(String, HeldEntityKind, String)>>,
    pub participants: RwLock<HashMap<String, Vec<NodeRef>>>,

    // Audit log
    pub search_queries: RwLock<Vec<SearchQueryEntry>>,
    pub address_searches: RwLock<Vec<SearchAddressEntry>>,

    // Failure injection
    /// Held-entity natural keys whose merge fails (rolling back the whole unit)
    pub failing_entity_keys: RwLock<HashSet<String>>,
    /// When set, every write method fails before touching state
    pub fail_writes: RwLock<bool>,
    /// When set, audit log appends fail
    pub fail_audit: RwLock<bool>,
    /// When set, session neighborhood reads fail
    pub fail_view_reads: RwLock<bool>,
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            actors: RwLock::new(HashMap::new()),
            addresses: RwLock::new(HashMap::new()),
            held_entities: RwLock::new(HashMap::new()),
            follows: RwLock::new(HashSet::new()),
            address_links: RwLock::new(Vec::new()),
            participants: RwLock::new(HashMap::new()),
            search_queries: RwLock::new(Vec::new()),
            address_searches: RwLock::new(Vec::new()),
            failing_entity_keys: RwLock::new(HashSet::new()),
            fail_writes: RwLock::new(false),
            fail_audit: RwLock::new(false),
            fail_view_reads: RwLock::new(false),
        }
    }

    // ========================================================================
    // Builder / seeding methods for tests
    // ========================================================================

    /// Seed an actor into the store.
    pub async fn with_actor(self, actor: ActorNode) -> Self {
        self.actors
            .write()
            .await
            .insert(actor.profile.id.clone(), actor);
        self
    }

    /// Seed an address into the store.
    pub async fn with_address(self, address: AddressNode) -> Self {
        self.addresses
            .write()
            .await
            .insert(address.address.clone(), address);
        self
    }

    /// Seed a session into the store.
    pub async fn with_session(self, session: SessionNode) -> Self {
        self.sessions
            .write()
            .await
            .insert(session.name.clone(), session);
        self
    }

    /// Make merges of the given natural key fail.
    pub async fn fail_entity_key(&self, key: &str) {
        self.failing_entity_keys.write().await.insert(key.to_string());
    }

    /// Toggle failure of every write method.
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    /// Toggle failure of audit log appends.
    pub async fn set_fail_audit(&self, fail: bool) {
        *self.fail_audit.write().await = fail;
    }

    /// Toggle failure of session neighborhood reads.
    pub async fn set_fail_view_reads(&self, fail: bool) {
        *self.fail_view_reads.write().await = fail;
    }

    // ========================================================================
    // Inspection helpers
    // ========================================================================

    /// Whether a directed FOLLOWS edge exists
    pub async fn has_follows(&self, from: &str, to: &str) -> bool {
        self.follows
            .read()
            .await
            .contains(&(from.to_string(), to.to_string()))
    }

    /// Number of relationships from an address to a held entity
    pub async fn link_count(&self, address: &str, kind: HeldEntityKind, key: &str) -> usize {
        self.address_links
            .read()
            .await
            .iter()
            .filter(|(a, k, n)| a == address && *k == kind && n == key)
            .count()
    }

    async fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.read().await {
            anyhow::bail!("mock store: writes disabled");
        }
        Ok(())
    }

    async fn resolve_node(&self, node_ref: &NodeRef) -> Option<GraphNode> {
        match node_ref.label {
            NodeLabel::Person => self
                .actors
                .read()
                .await
                .get(&node_ref.key)
                .map(GraphNode::from),
            NodeLabel::Address => self
                .addresses
                .read()
                .await
                .get(&node_ref.key)
                .map(GraphNode::from),
            _ => None,
        }
    }
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    // ========================================================================
    // Session operations
    // ========================================================================

    async fn ensure_session(&self, name: &str) -> Result<bool> {
        self.check_writable().await?;
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(name) {
            return Ok(false);
        }
        sessions.insert(
            name.to_string(),
            SessionNode {
                name: name.to_string(),
                end_date: None,
            },
        );
        Ok(true)
    }

    async fn get_session(&self, name: &str) -> Result<Option<SessionNode>> {
        Ok(self.sessions.read().await.get(name).cloned())
    }

    async fn add_participant(
        &self,
        session: &str,
        participant_id: &str,
    ) -> Result<Option<NodeLabel>> {
        self.ensure_session(session).await?;

        let label = if self.actors.read().await.contains_key(participant_id) {
            NodeLabel::Person
        } else if self.addresses.read().await.contains_key(participant_id) {
            NodeLabel::Address
        } else {
            return Ok(None);
        };

        let node_ref = NodeRef {
            label,
            key: participant_id.to_string(),
        };
        let mut participants = self.participants.write().await;
        let members = participants.entry(session.to_string()).or_default();
        if !members.contains(&node_ref) {
            members.push(node_ref);
        }
        Ok(Some(label))
    }

    async fn get_session_neighborhoods(
        &self,
        session: &str,
    ) -> Result<Vec<ParticipantNeighborhood>> {
        if *self.fail_view_reads.read().await {
            anyhow::bail!("mock store: view reads disabled");
        }
        let members = self
            .participants
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default();

        let mut neighborhoods = Vec::with_capacity(members.len());
        for member in members {
            let Some(participant) = self.resolve_node(&member).await else {
                continue;
            };

            let mut links = Vec::new();
            match member.label {
                NodeLabel::Person => {
                    let mut targets: Vec<String> = self
                        .follows
                        .read()
                        .await
                        .iter()
                        .filter(|(from, _)| *from == member.key)
                        .map(|(_, to)| to.clone())
                        .collect();
                    targets.sort();
                    let actors = self.actors.read().await;
                    for target in targets {
                        if let Some(actor) = actors.get(&target) {
                            links.push(NeighborLink {
                                relation: RelationKind::Follows,
                                node: GraphNode::from(actor),
                            });
                        }
                    }
                }
                NodeLabel::Address => {
                    let entities = self.held_entities.read().await;
                    for (address, kind, key) in self.address_links.read().await.iter() {
                        if *address != member.key {
                            continue;
                        }
                        if let Some(entity) = entities.get(&(*kind, key.clone())) {
                            links.push(NeighborLink {
                                relation: kind.relation(),
                                node: GraphNode::from(entity),
                            });
                        }
                    }
                }
                _ => {}
            }

            neighborhoods.push(ParticipantNeighborhood { participant, links });
        }

        Ok(neighborhoods)
    }

    async fn list_participant_sessions(&self, participant_ids: &[String]) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .participants
            .read()
            .await
            .iter()
            .filter(|(_, members)| members.iter().any(|m| participant_ids.contains(&m.key)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    // ========================================================================
    // Actor operations
    // ========================================================================

    async fn get_actor(&self, id: &str) -> Result<Option<ActorNode>> {
        Ok(self.actors.read().await.get(id).cloned())
    }

    async fn get_actor_by_screen_name(&self, screen_name: &str) -> Result<Option<ActorNode>> {
        Ok(self
            .actors
            .read()
            .await
            .values()
            .find(|a| a.profile.screen_name == screen_name)
            .cloned())
    }

    async fn upsert_actors(&self, actors: &[ActorProfile], stamp: &Stamp) -> Result<()> {
        self.check_writable().await?;
        let mut store = self.actors.write().await;
        for profile in actors {
            let profile = profile.clone().normalized();
            // A handle that moved to another id is released first
            for other in store.values_mut() {
                if other.profile.id != profile.id
                    && other.profile.screen_name == profile.screen_name
                {
                    other.profile.screen_name.clear();
                }
            }
            match store.get_mut(&profile.id) {
                Some(existing) => {
                    existing.profile = profile;
                    if existing.last_updated <= stamp.unix {
                        existing.last_updated = stamp.unix;
                        existing.last_updated_local = stamp.local.clone();
                    }
                }
                None => {
                    store.insert(
                        profile.id.clone(),
                        ActorNode {
                            profile,
                            last_updated: stamp.unix,
                            last_updated_local: stamp.local.clone(),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    async fn merge_follows(&self, actor_id: &str, counterpart_ids: &[String]) -> Result<usize> {
        self.check_writable().await?;
        let actors = self.actors.read().await;
        if !actors.contains_key(actor_id) {
            return Ok(0);
        }

        let mut follows = self.follows.write().await;
        let mut linked = HashSet::new();
        for cid in counterpart_ids {
            if cid == actor_id || !actors.contains_key(cid) {
                continue;
            }
            follows.insert((actor_id.to_string(), cid.clone()));
            follows.insert((cid.clone(), actor_id.to_string()));
            linked.insert(cid.clone());
        }
        Ok(linked.len())
    }

    // ========================================================================
    // Address operations
    // ========================================================================

    async fn ingest_address(&self, unit: &AddressIngest, stamp: &Stamp) -> Result<()> {
        self.check_writable().await?;

        // Fail before mutating anything, like a rolled-back transaction
        {
            let failing = self.failing_entity_keys.read().await;
            if let Some(bad) = unit
                .entities
                .iter()
                .find(|e| failing.contains(&e.natural_key))
            {
                anyhow::bail!(
                    "mock store: merge of {} {} failed",
                    bad.kind.label().as_str(),
                    bad.natural_key
                );
            }
        }

        let mut addresses = self.addresses.write().await;
        let mut entities = self.held_entities.write().await;
        let mut links = self.address_links.write().await;

        let address = addresses
            .entry(unit.address.clone())
            .or_insert_with(|| AddressNode {
                address: unit.address.clone(),
                ens: None,
                timestamp: stamp.unix,
                timestamp_local: stamp.local.clone(),
            });
        // ens is filled only while absent
        if address.ens.is_none() {
            address.ens = unit.ens.clone().filter(|e| !e.is_empty());
        }

        for descriptor in &unit.entities {
            entities
                .entry((descriptor.kind, descriptor.natural_key.clone()))
                .or_insert_with(|| HeldEntityNode {
                    kind: descriptor.kind,
                    natural_key: descriptor.natural_key.clone(),
                    name: descriptor.name.clone(),
                    count: descriptor.count.clone(),
                });

            let link = (
                unit.address.clone(),
                descriptor.kind,
                descriptor.natural_key.clone(),
            );
            if !links.contains(&link) {
                links.push(link);
            }
        }

        Ok(())
    }

    async fn get_address(&self, address: &str) -> Result<Option<AddressNode>> {
        Ok(self.addresses.read().await.get(address).cloned())
    }

    async fn get_held_entity(
        &self,
        kind: HeldEntityKind,
        natural_key: &str,
    ) -> Result<Option<HeldEntityNode>> {
        Ok(self
            .held_entities
            .read()
            .await
            .get(&(kind, natural_key.to_string()))
            .cloned())
    }

    // ========================================================================
    // Audit log
    // ========================================================================

    async fn record_search_query(&self, entry: &SearchQueryEntry) -> Result<()> {
        if *self.fail_audit.read().await {
            anyhow::bail!("mock store: audit log unavailable");
        }
        self.search_queries.write().await.push(entry.clone());
        Ok(())
    }

    async fn record_address_search(&self, entry: &SearchAddressEntry) -> Result<()> {
        if *self.fail_audit.read().await {
            anyhow::bail!("mock store: audit log unavailable");
        }
        self.address_searches.write().await.push(entry.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
