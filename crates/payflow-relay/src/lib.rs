//! Relay client, task waiter and per-chain routing for gasless payments.
//!
//! - Query relay task status and submit sponsored calls
//! - Poll a relay task until it completes, fails or runs out of budget
//! - Pick the relay tier (mainnet/testnet) serving a chain

use async_trait::async_trait;
use payflow_types::{Hex, RelayTaskStatus, Result, TaskId};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod gelato_client;
pub mod memory;
pub mod router;
pub mod waiter;

pub use config::{RelayConfig, WaitConfig};
pub use gelato_client::GelatoRelayClient;
pub use router::RelayRouter;
pub use waiter::RelayTaskWaiter;

/// Sponsored call to be executed by the relay on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredCallRequest {
    pub chain_id: u64,
    pub target: Hex,
    pub data: Hex,
}

impl SponsoredCallRequest {
    /// Build a request, normalizing `data` to 0x-prefixed lowercase hex.
    pub fn new(chain_id: u64, target: impl Into<Hex>, data: &str) -> Result<Self> {
        let bytes = payflow_types::hex_to_bytes(data)?;
        Ok(Self {
            chain_id,
            target: target.into(),
            data: payflow_types::bytes_to_hex(&bytes),
        })
    }
}

/// Connection to a transaction-relay provider.
///
/// Status queries never mutate relay-side state.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Current status of `task_id`, or `None` when the relay has none.
    async fn get_task_status(&self, task_id: &str) -> Result<Option<RelayTaskStatus>>;

    /// Submit a sponsored call and return the relay task id.
    async fn sponsored_call(&self, request: &SponsoredCallRequest) -> Result<TaskId>;
}
