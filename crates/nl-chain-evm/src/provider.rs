use async_trait::async_trait;
use nl_api_types::WalletAddress;
use nl_chain_client::{DappError, Subscription, WalletProvider};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::rpc::{JsonRpcClient, RpcError};

/// Wallet provider backed by a node that manages accounts
/// (`eth_accounts` / `eth_requestAccounts`).
///
/// Nodes have no push channel for account changes, so changes are found by
/// polling `eth_accounts` and emitting only when the sequence differs.
pub struct RpcWalletProvider {
    rpc: JsonRpcClient,
    poll_interval: Duration,
}

impl RpcWalletProvider {
    pub fn new(rpc: JsonRpcClient, poll_interval: Duration) -> Self {
        Self { rpc, poll_interval }
    }
}

fn to_addresses(raw: Vec<String>) -> Vec<WalletAddress> {
    raw.into_iter().map(WalletAddress).collect()
}

fn provider_error(method: &str, err: RpcError) -> DappError {
    if err.is_rejection() {
        return DappError::AuthorizationDenied(err.to_string());
    }
    warn!("{} failed: {}", method, err);
    DappError::ProviderUnavailable
}

async fn eth_accounts(rpc: &JsonRpcClient) -> Result<Vec<WalletAddress>, DappError> {
    rpc.call::<Vec<String>>("eth_accounts", json!([]))
        .await
        .map(to_addresses)
        .map_err(|err| provider_error("eth_accounts", err))
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn detect(&self) -> bool {
        match self.rpc.call::<String>("web3_clientVersion", json!([])).await {
            Ok(version) => {
                debug!(endpoint = self.rpc.endpoint(), version = %version, "wallet provider detected");
                true
            }
            Err(err) => {
                debug!(endpoint = self.rpc.endpoint(), "no wallet provider: {}", err);
                false
            }
        }
    }

    async fn accounts(&self) -> Result<Vec<WalletAddress>, DappError> {
        eth_accounts(&self.rpc).await
    }

    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, DappError> {
        self.rpc
            .call::<Vec<String>>("eth_requestAccounts", json!([]))
            .await
            .map(to_addresses)
            .map_err(|err| provider_error("eth_requestAccounts", err))
    }

    async fn subscribe_accounts(&self) -> Result<Subscription<Vec<WalletAddress>>, DappError> {
        let mut last = eth_accounts(&self.rpc).await.unwrap_or_default();
        let rpc = self.rpc.clone();
        let interval = self.poll_interval;
        let (tx, rx) = mpsc::unbounded_channel();

        let producer = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let current = match eth_accounts(&rpc).await {
                    Ok(accounts) => accounts,
                    Err(_) => continue,
                };
                if current == last {
                    continue;
                }
                last = current.clone();
                if tx.send(current).is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::with_task(rx, producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_node::{self, NodeReply};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    const ALICE: &str = "0x00000000000000000000000000000000000000a1";
    const BOB: &str = "0x00000000000000000000000000000000000000b2";

    #[tokio::test]
    async fn detect_is_false_without_node() {
        let provider = RpcWalletProvider::new(JsonRpcClient::new("http://127.0.0.1:9"), Duration::from_millis(10));
        assert!(!provider.detect().await);
        assert_eq!(provider.accounts().await, Err(DappError::ProviderUnavailable));
    }

    #[tokio::test]
    async fn rejected_request_is_authorization_denied() -> anyhow::Result<()> {
        let url = test_node::spawn(|method, _| match method {
            "web3_clientVersion" => NodeReply::Result(Value::String("geth".to_owned())),
            "eth_accounts" => NodeReply::Result(serde_json::json!([])),
            _ => NodeReply::Error(4001, "User rejected the request."),
        })
        .await?;
        let provider = RpcWalletProvider::new(JsonRpcClient::new(&url), Duration::from_millis(10));

        assert!(provider.detect().await);
        assert!(provider.accounts().await?.is_empty());
        let err = provider.request_accounts().await.unwrap_err();
        assert!(matches!(err, DappError::AuthorizationDenied(_)));
        Ok(())
    }

    #[tokio::test]
    async fn account_changes_are_pushed_once_each() -> anyhow::Result<()> {
        let accounts = Arc::new(Mutex::new(vec![ALICE.to_owned()]));
        let node_accounts = accounts.clone();
        let url = test_node::spawn(move |method, _| match method {
            "eth_accounts" => {
                let current = node_accounts.lock().unwrap().clone();
                NodeReply::Result(serde_json::json!(current))
            }
            _ => NodeReply::Error(-32601, "method not found"),
        })
        .await?;
        let provider = RpcWalletProvider::new(JsonRpcClient::new(&url), Duration::from_millis(10));
        let mut sub = provider.subscribe_accounts().await?;

        *accounts.lock().unwrap() = vec![BOB.to_owned()];
        let changed = tokio::time::timeout(Duration::from_secs(2), sub.next()).await?;
        assert_eq!(changed, Some(vec![WalletAddress(BOB.to_owned())]));

        accounts.lock().unwrap().clear();
        let changed = tokio::time::timeout(Duration::from_secs(2), sub.next()).await?;
        assert_eq!(changed, Some(Vec::new()));
        Ok(())
    }
}
