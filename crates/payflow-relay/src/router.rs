//! Routing of chains to relay tiers.

use std::sync::Arc;

use payflow_types::{RelayError, Result};

use crate::{GelatoRelayClient, RelayClient, RelayConfig, RelayTaskWaiter, WaitConfig};

/// Shared handle to a relay client.
pub type RelayClientHandle = Arc<dyn RelayClient>;

/// Maps chain ids to the relay client of their network tier.
pub struct RelayRouter {
    mainnet: RelayClientHandle,
    testnet: RelayClientHandle,
    mainnet_chains: Vec<u64>,
    testnet_chains: Vec<u64>,
    sponsored_count: u32,
    wait: WaitConfig,
}

impl RelayRouter {
    pub fn new(
        mainnet: RelayClientHandle,
        testnet: RelayClientHandle,
        config: &RelayConfig,
    ) -> Self {
        Self {
            mainnet,
            testnet,
            mainnet_chains: config.mainnet_chains.clone(),
            testnet_chains: config.testnet_chains.clone(),
            sponsored_count: config.sponsored_enabled,
            wait: config.wait,
        }
    }

    /// One Gelato client per tier, keyed with that tier's API key.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let mainnet = GelatoRelayClient::new(
            &config.base_url,
            config.mainnet_api_key.clone(),
            Some(config.request_timeout_ms),
        )?;
        let testnet = GelatoRelayClient::new(
            &config.base_url,
            config.testnet_api_key.clone(),
            Some(config.request_timeout_ms),
        )?;
        Ok(Self::new(Arc::new(mainnet), Arc::new(testnet), config))
    }

    pub fn client_for_chain(&self, chain_id: u64) -> Option<RelayClientHandle> {
        if self.mainnet_chains.contains(&chain_id) {
            return Some(self.mainnet.clone());
        }
        if self.testnet_chains.contains(&chain_id) {
            return Some(self.testnet.clone());
        }
        None
    }

    pub fn require_client(&self, chain_id: u64) -> Result<RelayClientHandle> {
        self.client_for_chain(chain_id)
            .ok_or(RelayError::UnsupportedChain(chain_id))
    }

    pub fn is_relay_supported(&self, chain_id: Option<u64>) -> bool {
        chain_id.is_some_and(|id| self.client_for_chain(id).is_some())
    }

    /// Number of sponsored transactions enabled for users.
    pub fn sponsored_count(&self) -> u32 {
        self.sponsored_count
    }

    pub fn waiter_for_chain(&self, chain_id: u64) -> Option<RelayTaskWaiter> {
        self.client_for_chain(chain_id)
            .map(|client| RelayTaskWaiter::new(client, self.wait))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRelay;
    use crate::SponsoredCallRequest;
    use payflow_types::{RelayTaskStatus, TaskState};

    fn router() -> (Arc<MemoryRelay>, Arc<MemoryRelay>, RelayRouter) {
        let mainnet = Arc::new(MemoryRelay::with_script([Some(
            RelayTaskStatus::new("m", TaskState::ExecSuccess).with_transaction_hash("0xmain"),
        )]));
        let testnet = Arc::new(MemoryRelay::with_script([Some(
            RelayTaskStatus::new("t", TaskState::ExecSuccess).with_transaction_hash("0xtest"),
        )]));
        let config = RelayConfig {
            sponsored_enabled: 2,
            wait: WaitConfig::new(1_000, 2_000),
            ..RelayConfig::default()
        };
        let router = RelayRouter::new(mainnet.clone(), testnet.clone(), &config);
        (mainnet, testnet, router)
    }

    #[test]
    fn test_relay_support_by_chain() {
        let (_, _, router) = router();
        assert!(router.is_relay_supported(Some(10)));
        assert!(router.is_relay_supported(Some(8453)));
        assert!(router.is_relay_supported(Some(84531)));
        assert!(!router.is_relay_supported(Some(1)));
        assert!(!router.is_relay_supported(None));
        assert!(matches!(
            router.require_client(1),
            Err(RelayError::UnsupportedChain(1))
        ));
        assert_eq!(router.sponsored_count(), 2);
    }

    #[tokio::test]
    async fn test_chains_route_to_their_tier() {
        let (mainnet, testnet, router) = router();
        let request = SponsoredCallRequest::new(10, "0xTarget", "0x").unwrap();

        router.require_client(10).unwrap().sponsored_call(&request).await.unwrap();
        router.require_client(420).unwrap().sponsored_call(&request).await.unwrap();
        router.require_client(280).unwrap().sponsored_call(&request).await.unwrap();

        assert_eq!(mainnet.submissions().len(), 1);
        assert_eq!(testnet.submissions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_uses_tier_and_wait_config() {
        let (mainnet, testnet, router) = router();
        let waiter = router.waiter_for_chain(8453).unwrap();
        assert_eq!(waiter.config(), WaitConfig::new(1_000, 2_000));

        assert_eq!(waiter.await_completion("m").await.unwrap(), "0xmain");
        assert_eq!(mainnet.query_count(), 1);
        assert_eq!(testnet.query_count(), 0);
        assert!(router.waiter_for_chain(1).is_none());
    }

    #[test]
    fn test_from_config_builds_both_tiers() {
        let router = RelayRouter::from_config(&RelayConfig::default()).unwrap();
        assert!(router.client_for_chain(10).is_some());
        assert!(router.client_for_chain(421613).is_some());
        assert_eq!(router.sponsored_count(), 0);
    }
}
