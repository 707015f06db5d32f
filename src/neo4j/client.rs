//! Neo4j client for the session graph

use super::models::*;
use anyhow::{Context, Result};
use neo4rs::{query, Graph, Query};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

/// Client for Neo4j operations
///
/// Connection pooling is owned by `neo4rs::Graph`; every method acquires a
/// connection for the duration of its own unit of work.
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        // Initialize schema
        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize the graph schema with uniqueness constraints and indexes
    async fn init_schema(&self) -> Result<()> {
        let mut constraints = vec![
            "CREATE CONSTRAINT person_id IF NOT EXISTS FOR (p:Person) REQUIRE p.id IS UNIQUE"
                .to_string(),
            "CREATE CONSTRAINT person_screen_name IF NOT EXISTS FOR (p:Person) REQUIRE p.screen_name IS UNIQUE"
                .to_string(),
            "CREATE CONSTRAINT address_address IF NOT EXISTS FOR (a:Address) REQUIRE a.address IS UNIQUE"
                .to_string(),
            "CREATE CONSTRAINT session_name IF NOT EXISTS FOR (s:Session) REQUIRE s.name IS UNIQUE"
                .to_string(),
        ];
        for kind in HeldEntityKind::ALL {
            let label = kind.label().as_str();
            let key = kind.key_field();
            constraints.push(format!(
                "CREATE CONSTRAINT {}_{} IF NOT EXISTS FOR (e:{}) REQUIRE e.{} IS UNIQUE",
                label.to_lowercase(),
                key,
                label,
                key
            ));
        }

        let indexes = vec![
            "CREATE INDEX search_query_text IF NOT EXISTS FOR (q:SearchQuery) ON (q.text)",
            "CREATE INDEX search_address_address IF NOT EXISTS FOR (q:SearchAddress) ON (q.address)",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(query(&constraint)).await {
                warn!("Constraint may already exist: {}", e);
            }
        }

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                warn!("Index may already exist: {}", e);
            }
        }

        Ok(())
    }

    /// Run several statements in one explicit transaction, rolling back on failure
    async fn run_in_txn(&self, queries: Vec<Query>) -> Result<()> {
        let mut txn = self
            .graph
            .start_txn()
            .await
            .context("Failed to start transaction")?;

        if let Err(e) = txn.run_queries(queries).await {
            if let Err(rollback_err) = txn.rollback().await {
                warn!("Rollback after failed statement also failed: {}", rollback_err);
            }
            return Err(anyhow::Error::from(e).context("Transaction rolled back"));
        }

        txn.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Merge a session by name, reporting whether it was created
    pub async fn ensure_session(&self, name: &str) -> Result<bool> {
        let q = query(
            r#"
            OPTIONAL MATCH (existing:Session {name: $name})
            WITH existing IS NULL AS created
            MERGE (s:Session {name: $name})
            RETURN created
            "#,
        )
        .param("name", name);

        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => Ok(row.get::<bool>("created").unwrap_or(false)),
            None => Ok(false),
        }
    }

    /// Get a session by name
    pub async fn get_session(&self, name: &str) -> Result<Option<SessionNode>> {
        let q = query(
            r#"
            MATCH (s:Session {name: $name})
            RETURN s
            "#,
        )
        .param("name", name);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("s")?;
            Ok(Some(SessionNode {
                name: node.get("name")?,
                end_date: node.get::<String>("end_date").ok(),
            }))
        } else {
            Ok(None)
        }
    }

    /// Link a Person or Address to a session (merging the session)
    pub async fn add_participant(
        &self,
        session: &str,
        participant_id: &str,
    ) -> Result<Option<NodeLabel>> {
        let q = query(
            r#"
            MERGE (s:Session {name: $session})
            WITH s
            OPTIONAL MATCH (p:Person {id: $participant_id})
            OPTIONAL MATCH (a:Address {address: $participant_id})
            WITH s, coalesce(p, a) AS participant
            WHERE participant IS NOT NULL
            MERGE (s)-[:HAS_PARTICIPANT]->(participant)
            RETURN labels(participant) AS labels
            "#,
        )
        .param("session", session)
        .param("participant_id", participant_id);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let labels: Vec<String> = row.get("labels")?;
            Ok(labels.iter().find_map(|l| NodeLabel::parse(l)))
        } else {
            Ok(None)
        }
    }

    /// Every participant with its outgoing neighbor relationships
    pub async fn get_session_neighborhoods(
        &self,
        session: &str,
    ) -> Result<Vec<ParticipantNeighborhood>> {
        let q = query(
            r#"
            MATCH (s:Session {name: $session})-[:HAS_PARTICIPANT]->(p)
            OPTIONAL MATCH (p)-[r:FOLLOWS|HOLDS|ATTENDED|HOLDS_ON_POLYGON]->(n)
            RETURN p, type(r) AS rel_type, n
            "#,
        )
        .param("session", session);

        let mut result = self.graph.execute(q).await?;
        let mut neighborhoods: Vec<ParticipantNeighborhood> = Vec::new();

        while let Some(row) = result.next().await? {
            let participant = node_to_graph(&row.get::<neo4rs::Node>("p")?)?;
            let key = participant.node_ref();

            let idx = match neighborhoods
                .iter()
                .position(|n| n.participant.node_ref() == key)
            {
                Some(idx) => idx,
                None => {
                    neighborhoods.push(ParticipantNeighborhood {
                        participant,
                        links: Vec::new(),
                    });
                    neighborhoods.len() - 1
                }
            };

            let rel_type = row.get::<String>("rel_type").ok();
            let neighbor = row.get::<neo4rs::Node>("n").ok();
            if let (Some(rel_type), Some(neighbor)) = (rel_type, neighbor) {
                let Some(relation) = RelationKind::parse(&rel_type) else {
                    continue;
                };
                neighborhoods[idx].links.push(NeighborLink {
                    relation,
                    node: node_to_graph(&neighbor)?,
                });
            }
        }

        Ok(neighborhoods)
    }

    /// Sessions containing any of the given participants
    pub async fn list_participant_sessions(&self, participant_ids: &[String]) -> Result<Vec<String>> {
        if participant_ids.is_empty() {
            return Ok(vec![]);
        }

        let q = query(
            r#"
            MATCH (s:Session)-[:HAS_PARTICIPANT]->(p)
            WHERE p.id IN $ids OR p.address IN $ids
            RETURN DISTINCT s.name AS name
            ORDER BY name
            "#,
        )
        .param("ids", participant_ids.to_vec());

        let mut result = self.graph.execute(q).await?;
        let mut names = Vec::new();
        while let Some(row) = result.next().await? {
            names.push(row.get::<String>("name")?);
        }
        Ok(names)
    }

    // ========================================================================
    // Actor operations
    // ========================================================================

    /// Get an actor by id
    pub async fn get_actor(&self, id: &str) -> Result<Option<ActorNode>> {
        let q = query(
            r#"
            MATCH (p:Person {id: $id})
            RETURN p
            "#,
        )
        .param("id", id);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("p")?;
            Ok(Some(node_to_actor(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Get an actor by (lowercased) screen name
    pub async fn get_actor_by_screen_name(&self, screen_name: &str) -> Result<Option<ActorNode>> {
        let q = query(
            r#"
            MATCH (p:Person {screen_name: $screen_name})
            RETURN p
            "#,
        )
        .param("screen_name", screen_name);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("p")?;
            Ok(Some(node_to_actor(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Merge-and-overwrite a batch of actors in one transaction
    pub async fn upsert_actors(&self, actors: &[ActorProfile], stamp: &Stamp) -> Result<()> {
        if actors.is_empty() {
            return Ok(());
        }

        let queries = actors
            .iter()
            .map(|actor| {
                query(
                    r#"
                    MERGE (p:Person {id: $id})
                    WITH p
                    // A handle that moved to another id is released first
                    OPTIONAL MATCH (old:Person {screen_name: $screen_name})
                    WHERE old.id <> $id
                    SET old.screen_name = null
                    WITH DISTINCT p, coalesce(p.last_updated, 0) <= $last_updated AS advance
                    SET p.name = $name,
                        p.screen_name = $screen_name,
                        p.description = $description,
                        p.profile_image_url = $profile_image_url,
                        p.created_at = $created_at,
                        p.verified = $verified,
                        p.followers_count = $followers_count,
                        p.friends_count = $friends_count,
                        p.last_updated = CASE WHEN advance THEN $last_updated ELSE p.last_updated END,
                        p.last_updated_local = CASE WHEN advance THEN $last_updated_local ELSE p.last_updated_local END
                    "#,
                )
                .param("id", actor.id.clone())
                .param("name", actor.name.clone())
                .param("screen_name", actor.screen_name.to_lowercase())
                .param("description", actor.description.clone())
                .param("profile_image_url", actor.profile_image_url.clone())
                .param("created_at", actor.created_at.clone())
                .param("verified", actor.verified)
                .param("followers_count", actor.followers_count)
                .param("friends_count", actor.friends_count)
                .param("last_updated", stamp.unix)
                .param("last_updated_local", stamp.local.clone())
            })
            .collect();

        self.run_in_txn(queries).await
    }

    /// Merge symmetric FOLLOWS edges to every existing counterpart
    pub async fn merge_follows(&self, actor_id: &str, counterpart_ids: &[String]) -> Result<usize> {
        if counterpart_ids.is_empty() {
            return Ok(0);
        }

        // Single statement, so it commits or fails as one implicit transaction
        let q = query(
            r#"
            MATCH (a:Person {id: $actor_id})
            UNWIND $counterpart_ids AS cid
            MATCH (b:Person {id: cid})
            WHERE b <> a
            MERGE (a)-[:FOLLOWS]->(b)
            MERGE (b)-[:FOLLOWS]->(a)
            RETURN count(DISTINCT b) AS linked
            "#,
        )
        .param("actor_id", actor_id)
        .param("counterpart_ids", counterpart_ids.to_vec());

        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => Ok(row.get::<i64>("linked").unwrap_or(0).max(0) as usize),
            None => Ok(0),
        }
    }

    // ========================================================================
    // Address operations
    // ========================================================================

    /// Merge an address with all of its held entities in one transaction
    pub async fn ingest_address(&self, unit: &AddressIngest, stamp: &Stamp) -> Result<()> {
        const MERGE_ADDRESS: &str = r#"
            MERGE (a:Address {address: $address})
            SET a.ens = coalesce(a.ens, CASE WHEN $ens = '' THEN null ELSE $ens END),
                a.timestamp = coalesce(a.timestamp, $timestamp),
                a.timestamp_local = coalesce(a.timestamp_local, $timestamp_local)
        "#;

        let address_params = |q: Query| {
            q.param("address", unit.address.clone())
                .param("ens", unit.ens.clone().unwrap_or_default())
                .param("timestamp", stamp.unix)
                .param("timestamp_local", stamp.local.clone())
        };

        let mut queries = vec![address_params(query(MERGE_ADDRESS))];

        for entity in &unit.entities {
            let kind = entity.kind;
            let count_set = kind
                .count_field()
                .map(|field| format!(", e.{} = $count", field))
                .unwrap_or_default();

            let cypher = format!(
                r#"
                MERGE (e:{label} {{{key}: $natural_key}})
                ON CREATE SET e.name = $name{count_set}
                WITH e
                {merge_address}
                MERGE (a)-[:{relation}]->(e)
                "#,
                label = kind.label().as_str(),
                key = kind.key_field(),
                count_set = count_set,
                merge_address = MERGE_ADDRESS,
                relation = kind.relation().as_str(),
            );

            queries.push(
                address_params(query(&cypher))
                    .param("natural_key", entity.natural_key.clone())
                    .param("name", entity.name.clone())
                    .param("count", entity.count.clone()),
            );
        }

        self.run_in_txn(queries).await
    }

    /// Get an address node
    pub async fn get_address(&self, address: &str) -> Result<Option<AddressNode>> {
        let q = query(
            r#"
            MATCH (a:Address {address: $address})
            RETURN a
            "#,
        )
        .param("address", address);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("a")?;
            Ok(Some(AddressNode {
                address: node.get("address")?,
                ens: node.get::<String>("ens").ok(),
                timestamp: node.get::<i64>("timestamp").unwrap_or(0),
                timestamp_local: node.get("timestamp_local").unwrap_or_default(),
            }))
        } else {
            Ok(None)
        }
    }

    /// Get a held entity by kind and natural key
    pub async fn get_held_entity(
        &self,
        kind: HeldEntityKind,
        natural_key: &str,
    ) -> Result<Option<HeldEntityNode>> {
        let cypher = format!(
            "MATCH (e:{} {{{}: $natural_key}}) RETURN e",
            kind.label().as_str(),
            kind.key_field()
        );
        let q = query(&cypher).param("natural_key", natural_key);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("e")?;
            Ok(Some(HeldEntityNode {
                kind,
                natural_key: natural_key.to_string(),
                name: node.get("name").unwrap_or_default(),
                count: kind
                    .count_field()
                    .and_then(|field| node.get::<String>(field).ok())
                    .unwrap_or_default(),
            }))
        } else {
            Ok(None)
        }
    }

    // ========================================================================
    // Audit log
    // ========================================================================

    /// Append a SearchQuery node
    pub async fn record_search_query(&self, entry: &SearchQueryEntry) -> Result<()> {
        let q = query(
            r#"
            CREATE (:SearchQuery {text: $text, timestamp: $timestamp, timestamp_local: $timestamp_local})
            "#,
        )
        .param("text", entry.text.clone())
        .param("timestamp", entry.timestamp)
        .param("timestamp_local", entry.timestamp_local.clone());

        self.graph.run(q).await?;
        Ok(())
    }

    /// Append a SearchAddress node
    pub async fn record_address_search(&self, entry: &SearchAddressEntry) -> Result<()> {
        let q = query(
            r#"
            CREATE (:SearchAddress {
                address: $address,
                screen_name: $screen_name,
                timestamp: $timestamp,
                timestamp_local: $timestamp_local
            })
            "#,
        )
        .param("address", entry.address.clone())
        .param("screen_name", entry.screen_name.clone())
        .param("timestamp", entry.timestamp)
        .param("timestamp_local", entry.timestamp_local.clone());

        self.graph.run(q).await?;
        Ok(())
    }

    /// Check connectivity
    pub async fn health_check(&self) -> Result<bool> {
        match self.graph.run(query("RETURN 1")).await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Neo4j health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// ============================================================================
// Row conversion helpers
// ============================================================================

fn node_to_actor(node: &neo4rs::Node) -> Result<ActorNode> {
    Ok(ActorNode {
        profile: ActorProfile {
            id: node.get("id")?,
            screen_name: node.get("screen_name").unwrap_or_default(),
            name: node.get("name").unwrap_or_default(),
            description: node.get("description").unwrap_or_default(),
            profile_image_url: node.get("profile_image_url").unwrap_or_default(),
            created_at: node.get("created_at").unwrap_or_default(),
            verified: node.get("verified").unwrap_or(false),
            followers_count: node.get("followers_count").unwrap_or(0),
            friends_count: node.get("friends_count").unwrap_or(0),
        },
        last_updated: node.get("last_updated").unwrap_or(0),
        last_updated_local: node.get("last_updated_local").unwrap_or_default(),
    })
}

/// Tag a node with its label, natural key and full property set
fn node_to_graph(node: &neo4rs::Node) -> Result<GraphNode> {
    let label = node
        .labels()
        .into_iter()
        .find_map(NodeLabel::parse)
        .context("Node carries no session-view label")?;
    let key: String = node
        .get(label.key_field())
        .with_context(|| format!("{} node has no {}", label.as_str(), label.key_field()))?;

    let mut properties = Map::new();
    for name in node.keys() {
        if let Some(value) = property_value(node, name) {
            properties.insert(name.to_string(), value);
        }
    }

    Ok(GraphNode {
        label,
        key,
        properties,
    })
}

fn property_value(node: &neo4rs::Node, name: &str) -> Option<Value> {
    if let Ok(s) = node.get::<String>(name) {
        return Some(Value::String(s));
    }
    if let Ok(i) = node.get::<i64>(name) {
        return Some(Value::from(i));
    }
    if let Ok(b) = node.get::<bool>(name) {
        return Some(Value::Bool(b));
    }
    if let Ok(f) = node.get::<f64>(name) {
        return serde_json::Number::from_f64(f).map(Value::Number);
    }
    if let Ok(list) = node.get::<Vec<String>>(name) {
        return Some(Value::from(list));
    }
    None
}
