//! Twitter v1.1 implementation of `SocialGraphClient`
//!
//! Uses app-only bearer authentication:
//! - `GET /1.1/users/show.json` for handle resolution
//! - `GET /1.1/friends/ids.json` / `GET /1.1/followers/ids.json` with cursor pagination
//! - `GET /1.1/users/lookup.json` for profile hydration (100 ids per call)

use super::traits::{SocialGraphClient, MAX_HYDRATION_BATCH};
use crate::neo4j::models::ActorProfile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Cursor value requesting the first page
const FIRST_CURSOR: &str = "-1";

/// HTTP client for the Twitter v1.1 REST API.
///
/// Cheaply cloneable (shares the reqwest client internally).
#[derive(Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

/// One page of an id listing
#[derive(Debug, Deserialize)]
struct IdsPage {
    #[serde(default)]
    ids: Vec<serde_json::Value>,
    #[serde(default)]
    next_cursor_str: Option<String>,
}

/// The subset of a v1.1 user object we keep
#[derive(Debug, Deserialize)]
struct TwitterUser {
    id_str: String,
    screen_name: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    profile_image_url_https: Option<String>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    followers_count: i64,
    #[serde(default)]
    friends_count: i64,
}

impl From<TwitterUser> for ActorProfile {
    fn from(user: TwitterUser) -> Self {
        ActorProfile {
            id: user.id_str,
            screen_name: user.screen_name,
            name: user.name,
            description: user.description.unwrap_or_default(),
            // Full-size avatar instead of the 48x48 thumbnail
            profile_image_url: user
                .profile_image_url_https
                .unwrap_or_default()
                .replace("_normal", ""),
            created_at: user.created_at,
            verified: user.verified,
            followers_count: user.followers_count,
            friends_count: user.friends_count,
        }
    }
}

impl TwitterClient {
    /// Create a new client against `base_url` (e.g. `https://api.twitter.com`)
    pub fn new(base_url: &str, bearer_token: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to reach social API at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Social API returned {} for {}: {}", status.as_u16(), path, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse social API response from {}", path))
    }

    /// Walk every page of an id listing, accumulating a deduplicated set
    async fn collect_ids(&self, path: &str, handle: &str) -> Result<HashSet<String>> {
        let mut ids = HashSet::new();
        let mut cursor = FIRST_CURSOR.to_string();
        let mut pages = 0usize;
        let mut seen_cursors = HashSet::new();

        loop {
            let page: IdsPage = self
                .get_json(
                    path,
                    &[
                        ("screen_name", handle),
                        ("cursor", cursor.as_str()),
                        ("stringify_ids", "true"),
                    ],
                )
                .await?;
            pages += 1;

            ids.extend(page.ids.into_iter().filter_map(|id| match id {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }));

            debug!(handle = %handle, path = %path, pages, total = ids.len(), "Fetched id page");

            match page.next_cursor_str.as_deref() {
                None | Some("") | Some("0") => break,
                Some(next) => {
                    seen_cursors.insert(cursor);
                    if seen_cursors.contains(next) {
                        anyhow::bail!(
                            "Social API repeated cursor {} for {} on {}",
                            next,
                            handle,
                            path
                        );
                    }
                    cursor = next.to_string();
                }
            }
        }

        Ok(ids)
    }
}

#[async_trait]
impl SocialGraphClient for TwitterClient {
    async fn resolve_actor_id(&self, handle: &str) -> Result<String> {
        let user: TwitterUser = self
            .get_json("/1.1/users/show.json", &[("screen_name", handle)])
            .await?;
        Ok(user.id_str)
    }

    async fn list_following_ids(&self, handle: &str) -> Result<HashSet<String>> {
        self.collect_ids("/1.1/friends/ids.json", handle).await
    }

    async fn list_follower_ids(&self, handle: &str) -> Result<HashSet<String>> {
        self.collect_ids("/1.1/followers/ids.json", handle).await
    }

    async fn hydrate_profiles(&self, ids: &[String]) -> Result<Vec<ActorProfile>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        if ids.len() > MAX_HYDRATION_BATCH {
            anyhow::bail!(
                "Cannot hydrate {} ids in one call (max {})",
                ids.len(),
                MAX_HYDRATION_BATCH
            );
        }

        let joined = ids.join(",");
        let users: Vec<TwitterUser> = self
            .get_json("/1.1/users/lookup.json", &[("user_id", joined.as_str())])
            .await?;
        Ok(users.into_iter().map(ActorProfile::from).collect())
    }
}
