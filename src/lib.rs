//! Session Graph
//!
//! Materializes session-scoped relationship graphs:
//! - Neo4j storage for actors, addresses, held entities and sessions
//! - Social API client for relationship sets and profile hydration
//! - Holdings provider for on-chain tokens, NFTs and attended events
//! - Pairwise common-neighbor views, rebroadcast over WebSocket on every change

pub mod api;
pub mod error;
pub mod events;
pub mod holdings;
pub mod neo4j;
pub mod session;
pub mod social;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    pub social: SocialYamlConfig,
    pub holdings: HoldingsYamlConfig,
    pub cache: CacheYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "neo4j".into(),
        }
    }
}

/// Social API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SocialYamlConfig {
    pub api_url: String,
    pub bearer_token: String,
    pub timeout_secs: u64,
}

impl Default for SocialYamlConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.twitter.com".into(),
            bearer_token: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Holdings provider configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HoldingsYamlConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HoldingsYamlConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/holdings".into(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Staleness and hydration tunables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheYamlConfig {
    pub freshness_threshold_secs: i64,
    pub hydration_batch_size: usize,
}

impl Default for CacheYamlConfig {
    fn default() -> Self {
        let settings = session::SessionSettings::default();
        Self {
            freshness_threshold_secs: settings.freshness_threshold_secs,
            hydration_batch_size: settings.hydration_batch_size,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub server_port: u16,
    pub social_api_url: String,
    pub social_bearer_token: String,
    pub social_timeout_secs: u64,
    pub holdings_api_url: String,
    pub holdings_api_key: Option<String>,
    pub holdings_timeout_secs: u64,
    pub freshness_threshold_secs: i64,
    pub hydration_batch_size: usize,
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            social_api_url: std::env::var("SOCIAL_API_URL").unwrap_or(yaml.social.api_url),
            social_bearer_token: std::env::var("SOCIAL_BEARER_TOKEN")
                .unwrap_or(yaml.social.bearer_token),
            social_timeout_secs: yaml.social.timeout_secs,
            holdings_api_url: std::env::var("HOLDINGS_API_URL").unwrap_or(yaml.holdings.api_url),
            holdings_api_key: std::env::var("HOLDINGS_API_KEY")
                .ok()
                .or(yaml.holdings.api_key),
            holdings_timeout_secs: yaml.holdings.timeout_secs,
            freshness_threshold_secs: std::env::var("FRESHNESS_THRESHOLD_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.cache.freshness_threshold_secs),
            hydration_batch_size: yaml.cache.hydration_batch_size,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    pub fn session_settings(&self) -> session::SessionSettings {
        session::SessionSettings {
            freshness_threshold_secs: self.freshness_threshold_secs,
            hydration_batch_size: self.hydration_batch_size,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<session::SessionGraphManager>,
    pub event_bus: Arc<events::EventBus>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state with all services initialized
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(
            neo4j::Neo4jClient::new(
                &config.neo4j_uri,
                &config.neo4j_user,
                &config.neo4j_password,
            )
            .await?,
        );

        let social = Arc::new(social::TwitterClient::new(
            &config.social_api_url,
            &config.social_bearer_token,
            Duration::from_secs(config.social_timeout_secs),
        )?);

        let holdings = Arc::new(holdings::HttpHoldingsProvider::new(
            &config.holdings_api_url,
            config.holdings_api_key.clone(),
            Duration::from_secs(config.holdings_timeout_secs),
        )?);

        let event_bus = Arc::new(events::EventBus::default());
        let manager = session::SessionGraphManager::new(
            store,
            social,
            holdings,
            config.session_settings(),
        )
        .with_event_emitter(event_bus.clone());

        Ok(Self {
            manager: Arc::new(manager),
            event_bus,
            config: Arc::new(config),
        })
    }
}

/// Connect every backend, bind the HTTP + WebSocket API and serve
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config).await?;
    tracing::info!("Connected to Neo4j");

    let server_state = Arc::new(api::handlers::ServerState {
        manager: state.manager,
        event_bus: state.event_bus,
    });
    let app = api::create_router(server_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Session graph API listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
