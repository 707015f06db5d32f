//! HTTP holdings provider
//!
//! Issues `GET {base_url}/{address}` and expects a JSON body shaped like
//! [`RawAddressPayload`]. An API key, when configured, is sent as a bearer
//! token.

use super::traits::{HoldingsProvider, RawAddressPayload};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// HTTP-based holdings provider.
///
/// Cheaply cloneable (shares the reqwest client internally).
#[derive(Clone)]
pub struct HttpHoldingsProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpHoldingsProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl HoldingsProvider for HttpHoldingsProvider {
    async fn query_holdings(&self, address: &str) -> Result<RawAddressPayload> {
        let url = format!("{}/{}", self.base_url, address);

        let mut req = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .with_context(|| format!("Failed to reach holdings provider at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Holdings provider returned {}: {}", status.as_u16(), body);
        }

        let mut payload: RawAddressPayload = response
            .json()
            .await
            .context("Failed to parse holdings payload")?;

        // Some providers omit the address from the body
        if payload.address.is_empty() {
            payload.address = address.to_string();
        }

        debug!(
            address = %payload.address,
            tokens = payload.tokens.as_ref().map_or(0, Vec::len),
            nfts = payload.nfts.as_ref().map_or(0, Vec::len),
            events = payload.events.as_ref().map_or(0, Vec::len),
            "Fetched holdings"
        );

        Ok(payload)
    }
}
