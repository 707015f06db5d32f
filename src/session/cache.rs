//! Staleness Cache Gate
//!
//! Decides whether a stored actor profile is recent enough to skip the
//! external re-fetch. Every check appends a `SearchQuery` audit entry,
//! whatever the outcome.

use crate::error::{require_non_empty, Result, SessionError};
use crate::neo4j::models::{ActorNode, SearchQueryEntry, Stamp};
use crate::neo4j::GraphStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default maximum profile age before a re-fetch is required
pub const DEFAULT_FRESHNESS_THRESHOLD_SECS: i64 = 86_400;

/// `true` when `now - last_updated < threshold`; the threshold itself is stale
pub fn is_fresh(last_updated: i64, now: i64, threshold_secs: i64) -> bool {
    now - last_updated < threshold_secs
}

/// Outcome of a freshness check
#[derive(Debug, Clone)]
pub struct FreshnessCheck {
    /// Case-folded handle that was looked up
    pub screen_name: String,
    /// Stored actor, if any
    pub actor: Option<ActorNode>,
    pub fresh: bool,
}

#[derive(Clone)]
pub struct StalenessGate {
    store: Arc<dyn GraphStore>,
    threshold_secs: i64,
}

impl StalenessGate {
    pub fn new(store: Arc<dyn GraphStore>, threshold_secs: i64) -> Self {
        Self {
            store,
            threshold_secs,
        }
    }

    pub fn threshold_secs(&self) -> i64 {
        self.threshold_secs
    }

    pub async fn check(&self, handle: &str) -> Result<FreshnessCheck> {
        self.check_at(handle, Utc::now()).await
    }

    /// Check freshness as of `now`
    pub async fn check_at(&self, handle: &str, now: DateTime<Utc>) -> Result<FreshnessCheck> {
        require_non_empty(handle, "actor handle")?;
        let screen_name = handle.trim().to_lowercase();

        let lookup = self.store.get_actor_by_screen_name(&screen_name).await;

        let stamp = Stamp::audit(now);
        let entry = SearchQueryEntry {
            text: screen_name.clone(),
            timestamp: stamp.unix,
            timestamp_local: stamp.local,
        };
        if let Err(e) = self.store.record_search_query(&entry).await {
            warn!(screen_name = %screen_name, "Failed to record search query: {}", e);
        }

        let actor = lookup.map_err(SessionError::Transaction)?;
        let fresh = actor
            .as_ref()
            .is_some_and(|a| is_fresh(a.last_updated, now.timestamp(), self.threshold_secs));

        debug!(screen_name = %screen_name, known = actor.is_some(), fresh, "Freshness check");

        Ok(FreshnessCheck {
            screen_name,
            actor,
            fresh,
        })
    }
}
