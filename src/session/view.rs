//! Session View Composer
//!
//! Builds the pairwise common-neighbor graph of a session from the
//! one-hop neighborhoods of its participants. Every ordered pair of
//! distinct participants yields one row per shared neighbor, or a single
//! row with no common node when they share nothing.

use crate::error::{require_non_empty, Result, SessionError};
use crate::neo4j::models::{
    GraphNode, NodeRef, ParticipantNeighborhood, RelationKind, ViewEdge, ViewRow,
};
use crate::neo4j::GraphStore;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionViewComposer {
    store: Arc<dyn GraphStore>,
}

impl SessionViewComposer {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Full view of a session, recomputed from current store state
    pub async fn compose(&self, session: &str) -> Result<Vec<ViewRow>> {
        require_non_empty(session, "session name")?;

        if self
            .store
            .get_session(session)
            .await
            .map_err(SessionError::Transaction)?
            .is_none()
        {
            return Err(SessionError::not_found(format!("session {}", session)));
        }

        let neighborhoods = self
            .store
            .get_session_neighborhoods(session)
            .await
            .map_err(SessionError::Transaction)?;

        Ok(compose_rows(&neighborhoods))
    }

    /// Rows whose first participant is `participant_id`
    pub async fn participant_view(
        &self,
        session: &str,
        participant_id: &str,
    ) -> Result<Vec<ViewRow>> {
        require_non_empty(participant_id, "participant id")?;
        let rows = self.compose(session).await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.participant.key == participant_id)
            .collect())
    }
}

/// Neighbors of one participant keyed by node identity, with every
/// relationship type that reaches them
type Grouped<'a> = BTreeMap<NodeRef, (&'a GraphNode, Vec<RelationKind>)>;

fn group_links(neighborhood: &ParticipantNeighborhood) -> Grouped<'_> {
    let mut grouped: Grouped<'_> = BTreeMap::new();
    for link in &neighborhood.links {
        let entry = grouped
            .entry(link.node.node_ref())
            .or_insert_with(|| (&link.node, Vec::new()));
        if !entry.1.contains(&link.relation) {
            entry.1.push(link.relation);
        }
    }
    grouped
}

/// Typed edges between a participant and a common node. FOLLOWS is stored
/// in both directions, so it yields both edges.
fn edges(from: &NodeRef, to: &NodeRef, relations: &[RelationKind]) -> Vec<ViewEdge> {
    let mut out = Vec::with_capacity(relations.len());
    for relation in relations {
        out.push(ViewEdge {
            relation: *relation,
            from: from.clone(),
            to: to.clone(),
        });
        if *relation == RelationKind::Follows {
            out.push(ViewEdge {
                relation: *relation,
                from: to.clone(),
                to: from.clone(),
            });
        }
    }
    out
}

/// Compose view rows from participant neighborhoods.
///
/// Pure function over already-fetched store state.
pub fn compose_rows(neighborhoods: &[ParticipantNeighborhood]) -> Vec<ViewRow> {
    let grouped: Vec<Grouped<'_>> = neighborhoods.iter().map(group_links).collect();
    let mut rows = Vec::new();

    for (i, a) in neighborhoods.iter().enumerate() {
        let a_ref = a.participant.node_ref();
        for (j, b) in neighborhoods.iter().enumerate() {
            let b_ref = b.participant.node_ref();
            if i == j || a_ref == b_ref {
                continue;
            }

            let before = rows.len();
            for (common_ref, (common, a_relations)) in &grouped[i] {
                if *common_ref == a_ref || *common_ref == b_ref {
                    continue;
                }
                let Some((_, b_relations)) = grouped[j].get(common_ref) else {
                    continue;
                };
                rows.push(ViewRow {
                    participant: a.participant.clone(),
                    other_participant: b.participant.clone(),
                    common: Some((*common).clone()),
                    participant_edges: edges(&a_ref, common_ref, a_relations),
                    other_participant_edges: edges(&b_ref, common_ref, b_relations),
                });
            }

            if rows.len() == before {
                rows.push(ViewRow {
                    participant: a.participant.clone(),
                    other_participant: b.participant.clone(),
                    common: None,
                    participant_edges: vec![],
                    other_participant_edges: vec![],
                });
            }
        }
    }

    rows
}
