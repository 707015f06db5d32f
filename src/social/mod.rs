//! Social graph client
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `SocialGraphClient` trait: handle resolution, paginated relationship
//!   id sets and batched profile hydration
//! - `TwitterClient`: real implementation over the v1.1 REST API
//! - `MockSocialClient`: in-memory mock for tests

pub mod client;
#[cfg(test)]
pub(crate) mod mock;
pub mod traits;

pub use client::TwitterClient;
pub use traits::{SocialGraphClient, MAX_HYDRATION_BATCH};
