//! Holdings provider
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `HoldingsProvider` trait: resolve holdings/attendance for an address
//! - `HttpHoldingsProvider`: real implementation over a JSON HTTP endpoint
//! - `MockHoldingsProvider`: in-memory mock for tests

#[cfg(test)]
pub(crate) mod mock;
pub mod provider;
pub mod traits;

pub use provider::HttpHoldingsProvider;
pub use traits::{HoldingsProvider, RawAddressPayload};
