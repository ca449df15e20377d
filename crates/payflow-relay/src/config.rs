//! Relay and wait configuration.
//!
//! Environment variables:
//! - `GELATO_MAINNET_API_KEY` / `GELATO_TESTNET_API_KEY`
//! - `GELATO_SPONSORED_ENABLED`
//! - `GELATO_RELAY_URL`
//! - `RELAY_REQUEST_TIMEOUT_MS`
//! - `RELAY_POLL_MS` / `RELAY_TIMEOUT_MS`

use std::time::Duration;

use payflow_types::{RelayError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RELAY_URL: &str = "https://relay.gelato.digital";

/// Optimism, Base.
pub const MAINNET_RELAY_CHAINS: [u64; 2] = [10, 8453];

/// Optimism Goerli, Base Goerli, Arbitrum Goerli, zkSync Era testnet.
pub const TESTNET_RELAY_CHAINS: [u64; 4] = [420, 84531, 421613, 280];

/// Polling parameters for awaiting a relay task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    pub poll_ms: u64,
    pub timeout_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_ms: 3_000,
            timeout_ms: 60_000,
        }
    }
}

impl WaitConfig {
    pub fn new(poll_ms: u64, timeout_ms: u64) -> Self {
        Self { poll_ms, timeout_ms }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_ms == 0 {
            return Err(RelayError::InvalidWaitConfig(
                "poll interval must be greater than zero".into(),
            ));
        }
        if self.timeout_ms < self.poll_ms {
            return Err(RelayError::InvalidWaitConfig(format!(
                "timeout {}ms is shorter than poll interval {}ms",
                self.timeout_ms, self.poll_ms
            )));
        }
        Ok(())
    }

    /// Maximum number of status queries: `ceil(timeout / poll_interval)`.
    pub fn max_polls(&self) -> Result<u64> {
        self.validate()?;
        Ok(self.timeout_ms.div_ceil(self.poll_ms))
    }
}

/// Relay provider configuration, one API key per network tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub base_url: String,
    pub mainnet_api_key: Option<String>,
    pub testnet_api_key: Option<String>,
    pub sponsored_enabled: u32,
    pub request_timeout_ms: u64,
    pub mainnet_chains: Vec<u64>,
    pub testnet_chains: Vec<u64>,
    pub wait: WaitConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RELAY_URL.to_string(),
            mainnet_api_key: None,
            testnet_api_key: None,
            sponsored_enabled: 0,
            request_timeout_ms: 30_000,
            mainnet_chains: MAINNET_RELAY_CHAINS.to_vec(),
            testnet_chains: TESTNET_RELAY_CHAINS.to_vec(),
            wait: WaitConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            base_url: lookup("GELATO_RELAY_URL").unwrap_or(defaults.base_url),
            mainnet_api_key: non_empty(lookup("GELATO_MAINNET_API_KEY")),
            testnet_api_key: non_empty(lookup("GELATO_TESTNET_API_KEY")),
            sponsored_enabled: parse_var(&lookup, "GELATO_SPONSORED_ENABLED")?
                .unwrap_or(defaults.sponsored_enabled),
            request_timeout_ms: parse_var(&lookup, "RELAY_REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout_ms),
            mainnet_chains: defaults.mainnet_chains,
            testnet_chains: defaults.testnet_chains,
            wait: WaitConfig {
                poll_ms: parse_var(&lookup, "RELAY_POLL_MS")?.unwrap_or(defaults.wait.poll_ms),
                timeout_ms: parse_var(&lookup, "RELAY_TIMEOUT_MS")?
                    .unwrap_or(defaults.wait.timeout_ms),
            },
        };
        config.wait.validate()?;
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RelayError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}
