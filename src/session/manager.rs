//! Session Graph Manager
//!
//! The operations consumed by the API layer. Each mutation is one atomic
//! unit of work in the store; once it has committed, the affected session
//! views are recomposed and broadcast. A notification problem never
//! undoes or fails the mutation.

use super::cache::StalenessGate;
use super::common::{fetch_relationship_sets, CommonConnectionResolver};
use super::ingest::transform;
use super::view::SessionViewComposer;
use super::SessionSettings;
use crate::error::{require_non_empty, Result, SessionError};
use crate::events::{ChangeNotifier, EventEmitter};
use crate::holdings::{HoldingsProvider, RawAddressPayload};
use crate::neo4j::models::*;
use crate::neo4j::GraphStore;
use crate::social::SocialGraphClient;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of an actor refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRefresh {
    pub actor_id: String,
    /// Whether the external sources were queried
    pub refreshed: bool,
    /// Number of common connections hydrated (0 when fresh)
    pub common_connections: usize,
}

/// Result of an address refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRefresh {
    pub address: String,
    pub entities: usize,
}

pub struct SessionGraphManager {
    store: Arc<dyn GraphStore>,
    social: Arc<dyn SocialGraphClient>,
    holdings: Arc<dyn HoldingsProvider>,
    gate: StalenessGate,
    resolver: CommonConnectionResolver,
    composer: SessionViewComposer,
    notifier: Option<ChangeNotifier>,
}

impl SessionGraphManager {
    pub fn new(
        store: Arc<dyn GraphStore>,
        social: Arc<dyn SocialGraphClient>,
        holdings: Arc<dyn HoldingsProvider>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            gate: StalenessGate::new(store.clone(), settings.freshness_threshold_secs),
            resolver: CommonConnectionResolver::new(
                social.clone(),
                store.clone(),
                settings.hydration_batch_size,
            ),
            composer: SessionViewComposer::new(store.clone()),
            notifier: None,
            store,
            social,
            holdings,
        }
    }

    /// Broadcast recomposed views through `emitter` after every mutation (builder pattern).
    pub fn with_event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.notifier = Some(ChangeNotifier::new(self.store.clone(), emitter));
        self
    }

    async fn notify_participants(&self, participant_ids: &[String]) {
        if let Some(notifier) = &self.notifier {
            notifier.participants_changed(participant_ids).await;
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Create the session if absent. Returns true if it was created.
    pub async fn ensure_session(&self, name: &str) -> Result<bool> {
        require_non_empty(name, "session name")?;
        let created = self
            .store
            .ensure_session(name)
            .await
            .map_err(SessionError::Transaction)?;
        if created {
            info!(session = %name, "Session created");
        }
        Ok(created)
    }

    pub async fn get_session(&self, name: &str) -> Result<SessionNode> {
        require_non_empty(name, "session name")?;
        self.store
            .get_session(name)
            .await
            .map_err(SessionError::Transaction)?
            .ok_or_else(|| SessionError::not_found(format!("session {}", name)))
    }

    pub async fn get_session_end_date(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get_session(name).await?.end_date)
    }

    /// Add a Person (by id) or Address to a session, creating the session if needed
    pub async fn add_participant(&self, participant_id: &str, session: &str) -> Result<NodeLabel> {
        require_non_empty(participant_id, "participant id")?;
        require_non_empty(session, "session name")?;

        let label = self
            .store
            .add_participant(session, participant_id)
            .await
            .map_err(SessionError::Transaction)?
            .ok_or_else(|| SessionError::not_found(format!("participant {}", participant_id)))?;

        info!(session = %session, participant = %participant_id, label = label.as_str(), "Participant added");

        if let Some(notifier) = &self.notifier {
            notifier.participant_joined(session, participant_id).await;
        }
        Ok(label)
    }

    pub async fn get_session_view(&self, session: &str) -> Result<Vec<ViewRow>> {
        self.composer.compose(session).await
    }

    pub async fn get_participant_view(
        &self,
        session: &str,
        participant_id: &str,
    ) -> Result<Vec<ViewRow>> {
        self.composer.participant_view(session, participant_id).await
    }

    // ========================================================================
    // Actors
    // ========================================================================

    pub async fn is_actor_fresh(&self, handle: &str) -> Result<bool> {
        Ok(self.gate.check(handle).await?.fresh)
    }

    /// Merge an actor and overwrite its mutable fields
    pub async fn upsert_actor(&self, profile: ActorProfile) -> Result<()> {
        require_non_empty(&profile.id, "actor id")?;
        require_non_empty(&profile.screen_name, "screen name")?;

        let profile = profile.normalized();
        self.store
            .upsert_actors(std::slice::from_ref(&profile), &Stamp::actor(Utc::now()))
            .await
            .map_err(SessionError::Transaction)?;

        info!(actor_id = %profile.id, screen_name = %profile.screen_name, "Actor upserted");
        self.notify_participants(&[profile.id]).await;
        Ok(())
    }

    /// Merge FOLLOWS in both directions between the actor and each existing
    /// counterpart. Returns the number of counterparts linked.
    pub async fn add_follows_edges(&self, actor_id: &str, counterpart_ids: &[String]) -> Result<usize> {
        require_non_empty(actor_id, "actor id")?;

        let counterparts: Vec<String> = counterpart_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && id != actor_id)
            .collect();
        if counterparts.is_empty() {
            return Ok(0);
        }

        let linked = self
            .store
            .merge_follows(actor_id, &counterparts)
            .await
            .map_err(SessionError::Transaction)?;

        info!(actor_id = %actor_id, requested = counterparts.len(), linked, "FOLLOWS merged");

        if linked > 0 {
            let mut affected = counterparts;
            affected.push(actor_id.to_string());
            self.notify_participants(&affected).await;
        }
        Ok(linked)
    }

    /// Fetch both relationship sets of `handle` and hydrate their intersection
    pub async fn resolve_common_connections(&self, handle: &str) -> Result<Vec<ActorProfile>> {
        let sets = fetch_relationship_sets(self.social.as_ref(), handle).await?;
        self.resolver.resolve(&sets).await
    }

    /// Bring an actor up to date and add it to a session.
    ///
    /// A fresh actor skips the external fetch; the participant add and view
    /// broadcast always run.
    pub async fn refresh_actor(&self, handle: &str, session: &str) -> Result<ActorRefresh> {
        require_non_empty(handle, "actor handle")?;
        require_non_empty(session, "session name")?;

        let check = self.gate.check(handle).await?;

        let outcome = match check.actor {
            Some(actor) if check.fresh => ActorRefresh {
                actor_id: actor.profile.id,
                refreshed: false,
                common_connections: 0,
            },
            _ => self.refetch_actor(handle).await?,
        };

        if outcome.refreshed {
            self.notify_participants(std::slice::from_ref(&outcome.actor_id))
                .await;
        }

        self.add_participant(&outcome.actor_id, session).await?;
        info!(
            handle = %check.screen_name,
            session = %session,
            refreshed = outcome.refreshed,
            common = outcome.common_connections,
            "Actor refreshed"
        );
        Ok(outcome)
    }

    async fn refetch_actor(&self, handle: &str) -> Result<ActorRefresh> {
        let actor_id = self
            .social
            .resolve_actor_id(handle)
            .await
            .map_err(SessionError::Upstream)?;

        let own = self
            .social
            .hydrate_profiles(std::slice::from_ref(&actor_id))
            .await
            .map_err(SessionError::Upstream)?
            .into_iter()
            .find(|p| p.id == actor_id)
            .ok_or_else(|| SessionError::not_found(format!("actor {}", handle)))?;

        self.store
            .upsert_actors(&[own.normalized()], &Stamp::actor(Utc::now()))
            .await
            .map_err(SessionError::Transaction)?;

        let sets = fetch_relationship_sets(self.social.as_ref(), handle).await?;
        let common = self.resolver.resolve(&sets).await?;

        let common_ids: Vec<String> = common.iter().map(|p| p.id.clone()).collect();
        if !common_ids.is_empty() {
            self.store
                .merge_follows(&actor_id, &common_ids)
                .await
                .map_err(SessionError::Transaction)?;
        }

        Ok(ActorRefresh {
            actor_id,
            refreshed: true,
            common_connections: common.len(),
        })
    }

    // ========================================================================
    // Addresses
    // ========================================================================

    /// Transform and upsert one address payload in a single transaction.
    /// Returns the number of entity descriptors applied.
    pub async fn ingest_address_entities(&self, payload: &RawAddressPayload) -> Result<usize> {
        require_non_empty(&payload.address, "address")?;

        let unit = transform(payload);
        self.store
            .ingest_address(&unit, &Stamp::audit(Utc::now()))
            .await
            .map_err(SessionError::Transaction)?;

        info!(address = %unit.address, entities = unit.entities.len(), "Address ingested");
        self.notify_participants(std::slice::from_ref(&unit.address))
            .await;
        Ok(unit.entities.len())
    }

    /// Fetch an address's holdings, upsert them and add it to a session
    pub async fn refresh_address(&self, address: &str, session: &str) -> Result<AddressRefresh> {
        require_non_empty(address, "address")?;
        require_non_empty(session, "session name")?;

        let mut payload = self
            .holdings
            .query_holdings(address)
            .await
            .map_err(SessionError::Upstream)?;
        if payload.address.trim().is_empty() {
            payload.address = address.to_string();
        }

        let entities = self.ingest_address_entities(&payload).await?;
        let address = payload.address.trim().to_string();
        self.add_participant(&address, session).await?;

        Ok(AddressRefresh { address, entities })
    }

    /// Append a `SearchAddress` audit entry. Store failures are only logged.
    pub async fn log_address_search(&self, address: &str, screen_name: &str) -> Result<()> {
        require_non_empty(address, "address")?;

        let stamp = Stamp::audit(Utc::now());
        let entry = SearchAddressEntry {
            address: address.to_string(),
            screen_name: screen_name.to_string(),
            timestamp: stamp.unix,
            timestamp_local: stamp.local,
        };
        if let Err(e) = self.store.record_address_search(&entry).await {
            warn!(address = %address, "Failed to record address search: {}", e);
        }
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }
}
