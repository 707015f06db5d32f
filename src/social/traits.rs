//! SocialGraphClient trait definition

use crate::neo4j::models::ActorProfile;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Upper bound on ids per `hydrate_profiles` call imposed by the social API
pub const MAX_HYDRATION_BATCH: usize = 100;

/// Abstract interface to the external social graph.
///
/// Paginated methods fetch every page before returning; pages for one
/// actor are requested sequentially, each after the previous completed.
#[async_trait]
pub trait SocialGraphClient: Send + Sync {
    /// Resolve a human-readable handle to the stable actor id
    async fn resolve_actor_id(&self, handle: &str) -> Result<String>;

    /// Ids of every actor the handle follows
    async fn list_following_ids(&self, handle: &str) -> Result<HashSet<String>>;

    /// Ids of every actor following the handle
    async fn list_follower_ids(&self, handle: &str) -> Result<HashSet<String>>;

    /// Full profile records for at most [`MAX_HYDRATION_BATCH`] ids
    async fn hydrate_profiles(&self, ids: &[String]) -> Result<Vec<ActorProfile>>;
}
