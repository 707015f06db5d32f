//! Relationship Set Fetcher and Common-Connection Resolver
//!
//! Common connections are the actors present in both the "follows" and
//! "followed-by" sets of a reference actor. They are hydrated in batches
//! of at most [`MAX_HYDRATION_BATCH`] ids, fanned out concurrently; a
//! failed batch is logged and skipped.

use crate::error::{require_non_empty, Result, SessionError};
use crate::neo4j::models::{ActorProfile, Stamp};
use crate::neo4j::GraphStore;
use crate::social::{SocialGraphClient, MAX_HYDRATION_BATCH};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Fully paginated outbound and inbound relationship ids of one actor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSets {
    pub following: HashSet<String>,
    pub followers: HashSet<String>,
}

impl RelationshipSets {
    /// Ids present in both sets
    pub fn common_ids(&self) -> HashSet<String> {
        self.following
            .intersection(&self.followers)
            .cloned()
            .collect()
    }
}

/// Fetch both relationship sets of `handle` concurrently.
///
/// Pages within each set are fetched sequentially by the client.
pub async fn fetch_relationship_sets(
    client: &dyn SocialGraphClient,
    handle: &str,
) -> Result<RelationshipSets> {
    require_non_empty(handle, "actor handle")?;

    let (following, followers) = tokio::try_join!(
        client.list_following_ids(handle),
        client.list_follower_ids(handle),
    )
    .map_err(SessionError::Upstream)?;

    Ok(RelationshipSets {
        following,
        followers,
    })
}

#[derive(Clone)]
pub struct CommonConnectionResolver {
    social: Arc<dyn SocialGraphClient>,
    store: Arc<dyn GraphStore>,
    batch_size: usize,
}

impl CommonConnectionResolver {
    /// `batch_size` is clamped to `1..=MAX_HYDRATION_BATCH`
    pub fn new(
        social: Arc<dyn SocialGraphClient>,
        store: Arc<dyn GraphStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            social,
            store,
            batch_size: batch_size.clamp(1, MAX_HYDRATION_BATCH),
        }
    }

    /// Hydrate and upsert the common connections of `sets`.
    ///
    /// Returns the deduplicated profiles of every batch that succeeded;
    /// order is unspecified. Only a failed upsert fails the call.
    pub async fn resolve(&self, sets: &RelationshipSets) -> Result<Vec<ActorProfile>> {
        let mut candidates: Vec<String> = sets.common_ids().into_iter().collect();
        if candidates.is_empty() {
            return Ok(vec![]);
        }
        candidates.sort();

        let batches: Vec<&[String]> = candidates.chunks(self.batch_size).collect();
        let results = join_all(
            batches
                .iter()
                .map(|batch| self.social.hydrate_profiles(batch)),
        )
        .await;

        let mut seen = HashSet::new();
        let mut profiles = Vec::new();
        let mut failed_batches = 0usize;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(batch) => {
                    for profile in batch {
                        if seen.insert(profile.id.clone()) {
                            profiles.push(profile.normalized());
                        }
                    }
                }
                Err(e) => {
                    failed_batches += 1;
                    warn!(
                        batch = index + 1,
                        of = batches.len(),
                        ids = batches[index].len(),
                        "Profile hydration batch failed, skipping: {:#}",
                        e
                    );
                }
            }
        }

        if !profiles.is_empty() {
            self.store
                .upsert_actors(&profiles, &Stamp::actor(Utc::now()))
                .await
                .map_err(SessionError::Transaction)?;
        }

        info!(
            candidates = candidates.len(),
            hydrated = profiles.len(),
            failed_batches,
            "Resolved common connections"
        );

        Ok(profiles)
    }
}
