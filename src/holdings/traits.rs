//! HoldingsProvider trait definition

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw holdings payload for one address, as returned by the upstream provider.
///
/// Element shapes differ per sub-key and per provider, so elements stay
/// untyped here and are normalized by the ingest transformer. Absent
/// sub-keys mean "no entities of that kind".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddressPayload {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfts: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_nfts: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_tokens: Option<Vec<Value>>,
}

/// Abstract interface to the on-chain holdings/attendance provider.
#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    /// Resolve everything the address holds or attended
    async fn query_holdings(&self, address: &str) -> Result<RawAddressPayload>;
}
