//! Mock social graph client for tests
//!
//! Serves relationship sets and profiles from in-memory maps. Hydration
//! batches containing a configured "poison" id fail, which lets tests
//! exercise the partial-failure path of common-connection resolution.

use super::traits::{SocialGraphClient, MAX_HYDRATION_BATCH};
use crate::neo4j::models::ActorProfile;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockSocialClient {
    ids: HashMap<String, String>,
    following: HashMap<String, HashSet<String>>,
    followers: HashMap<String, HashSet<String>>,
    profiles: HashMap<String, ActorProfile>,
    failing_ids: HashSet<String>,
    /// Sizes of every hydration call, in call order
    pub hydration_calls: Mutex<Vec<usize>>,
}

impl MockSocialClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle with its id and profile
    pub fn with_actor(mut self, handle: &str, profile: ActorProfile) -> Self {
        self.ids.insert(handle.to_lowercase(), profile.id.clone());
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    /// Register a profile that can be hydrated but has no handle mapping
    pub fn with_profile(mut self, profile: ActorProfile) -> Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    pub fn with_following(mut self, handle: &str, ids: &[&str]) -> Self {
        self.following.insert(
            handle.to_lowercase(),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_followers(mut self, handle: &str, ids: &[&str]) -> Self {
        self.followers.insert(
            handle.to_lowercase(),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Fail any hydration batch that contains `id`
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn hydration_call_count(&self) -> usize {
        self.hydration_calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SocialGraphClient for MockSocialClient {
    async fn resolve_actor_id(&self, handle: &str) -> Result<String> {
        self.ids
            .get(&handle.to_lowercase())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("mock social: unknown handle {}", handle))
    }

    async fn list_following_ids(&self, handle: &str) -> Result<HashSet<String>> {
        Ok(self
            .following
            .get(&handle.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn list_follower_ids(&self, handle: &str) -> Result<HashSet<String>> {
        Ok(self
            .followers
            .get(&handle.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn hydrate_profiles(&self, ids: &[String]) -> Result<Vec<ActorProfile>> {
        if let Ok(mut calls) = self.hydration_calls.lock() {
            calls.push(ids.len());
        }
        if ids.len() > MAX_HYDRATION_BATCH {
            anyhow::bail!("mock social: batch of {} exceeds ceiling", ids.len());
        }
        if let Some(bad) = ids.iter().find(|id| self.failing_ids.contains(*id)) {
            anyhow::bail!("mock social: lookup failed for batch containing {}", bad);
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.profiles.get(id).cloned())
            .collect())
    }
}
