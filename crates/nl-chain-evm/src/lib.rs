//! JSON-RPC backed implementations of the dashboard's chain seams.
//!
//! One [`JsonRpcClient`] is built per process and shared by the wallet
//! provider and the contract client.

pub mod abi;
pub mod contract;
pub mod metadata;
pub mod provider;
pub mod rpc;

#[cfg(test)]
mod test_node;

pub use contract::Erc721Contract;
pub use metadata::HttpMetadataFetcher;
pub use provider::RpcWalletProvider;
pub use rpc::{JsonRpcClient, RpcError};

use std::time::Duration;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x214519c6105298767B004C3A07732b33E4761be5";

/// Node and contract settings.
///
/// `Default` reads the `NL_*` environment variables, falling back to a
/// local development node.
#[derive(Debug, Clone)]
pub struct EvmConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// Solidity signature of the contract's mint event, hashed into topic0.
    /// `None` disables mint watching.
    pub mint_event_signature: Option<String>,
    pub poll_interval: Duration,
    pub ipfs_gateway: String,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            rpc_url: defaults::rpc_url(),
            contract_address: defaults::contract_address(),
            mint_event_signature: defaults::mint_event_signature(),
            poll_interval: defaults::poll_interval(),
            ipfs_gateway: defaults::ipfs_gateway(),
        }
    }
}

mod defaults {
    use std::time::Duration;

    fn non_empty_env(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    pub fn rpc_url() -> String {
        non_empty_env("NL_RPC_URL").unwrap_or_else(|| "http://localhost:8545".to_owned())
    }

    pub fn contract_address() -> String {
        non_empty_env("NL_CONTRACT_ADDRESS").unwrap_or_else(|| super::DEFAULT_CONTRACT_ADDRESS.to_owned())
    }

    pub fn mint_event_signature() -> Option<String> {
        mint_event_signature_from(non_empty_env("NL_MINT_EVENT_SIGNATURE"))
    }

    /// `off` turns mint watching off; unset falls back to `MintEvent(address,uint256)`.
    pub(crate) fn mint_event_signature_from(value: Option<String>) -> Option<String> {
        match value {
            Some(value) if value.eq_ignore_ascii_case("off") => None,
            Some(value) => Some(value),
            None => Some(crate::abi::DEFAULT_MINT_EVENT_SIGNATURE.to_owned()),
        }
    }

    pub fn poll_interval() -> Duration {
        let millis = non_empty_env("NL_POLL_INTERVAL_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|millis| *millis > 0)
            .unwrap_or(2_000);
        Duration::from_millis(millis)
    }

    pub fn ipfs_gateway() -> String {
        non_empty_env("NL_IPFS_GATEWAY").unwrap_or_else(|| "https://ipfs.io/ipfs/".to_owned())
    }
}
