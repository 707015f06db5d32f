//! Session graph materialization
//!
//! - `cache`: Staleness Cache Gate
//! - `common`: Relationship Set Fetcher and Common-Connection Resolver
//! - `ingest`: Entity Ingest Transformer
//! - `view`: Session View Composer
//! - `manager`: `SessionGraphManager`, the operations exposed to the API

pub mod cache;
pub mod common;
pub mod ingest;
mod manager;
pub mod view;

pub use cache::{is_fresh, FreshnessCheck, StalenessGate, DEFAULT_FRESHNESS_THRESHOLD_SECS};
pub use common::{fetch_relationship_sets, CommonConnectionResolver, RelationshipSets};
pub use manager::{ActorRefresh, AddressRefresh, SessionGraphManager};
pub use view::SessionViewComposer;

use crate::social::MAX_HYDRATION_BATCH;

/// Tunables for the session layer
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Maximum stored profile age before a re-fetch (default: 86400)
    pub freshness_threshold_secs: i64,
    /// Ids per hydration call, capped at the social API ceiling (default: 100)
    pub hydration_batch_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            freshness_threshold_secs: DEFAULT_FRESHNESS_THRESHOLD_SECS,
            hydration_batch_size: MAX_HYDRATION_BATCH,
        }
    }
}
