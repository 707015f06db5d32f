//! Mock holdings provider for tests

use super::traits::{HoldingsProvider, RawAddressPayload};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Default)]
pub struct MockHoldingsProvider {
    payloads: HashMap<String, RawAddressPayload>,
}

impl MockHoldingsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, payload: RawAddressPayload) -> Self {
        self.payloads.insert(payload.address.clone(), payload);
        self
    }
}

#[async_trait]
impl HoldingsProvider for MockHoldingsProvider {
    async fn query_holdings(&self, address: &str) -> Result<RawAddressPayload> {
        self.payloads
            .get(address)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("mock holdings: provider has no data for {}", address))
    }
}
