use async_trait::async_trait;
use nl_api_types::{TokenId, WalletAddress};
use nl_chain_client::{DappError, MintEvent, NftContract, Subscription};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::abi;
use crate::rpc::{JsonRpcClient, RpcError, parse_quantity, to_quantity};

/// ERC-721 contract reached through `eth_call` / `eth_getLogs`.
pub struct Erc721Contract {
    rpc: JsonRpcClient,
    address: String,
    /// topic0 of the watched mint event; `None` disables mint watching.
    mint_event_topic: Option<String>,
    poll_interval: Duration,
}

impl Erc721Contract {
    pub fn new(
        rpc: JsonRpcClient,
        address: &str,
        mint_event_signature: Option<&str>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            rpc,
            address: address.to_owned(),
            mint_event_topic: mint_event_signature.map(abi::event_topic),
            poll_interval,
        }
    }

    async fn eth_call(&self, call: &'static str, data: String) -> Result<Vec<u8>, DappError> {
        let raw: String = self
            .rpc
            .call("eth_call", json!([{ "to": self.address, "data": data }, "latest"]))
            .await
            .map_err(|err| DappError::contract_read(call, err))?;
        abi::decode_hex(&raw).map_err(|err| DappError::contract_read(call, err))
    }
}

#[derive(Debug, Deserialize)]
struct LogEntry {
    topics: Vec<String>,
    #[serde(default)]
    data: String,
    #[serde(default, rename = "blockNumber")]
    block_number: Option<String>,
    #[serde(default, rename = "transactionHash")]
    transaction_hash: Option<String>,
}

impl LogEntry {
    fn into_mint_event(self) -> Result<MintEvent, String> {
        let to_topic = self
            .topics
            .get(1)
            .ok_or_else(|| "mint log has no recipient topic".to_owned())?;
        let to = abi::topic_address(abi::parse_topic(to_topic)?);

        // Token id is the second indexed argument when present, else the first data word.
        let token_id = match self.topics.get(2) {
            Some(topic) => Some(abi::topic_uint(abi::parse_topic(topic)?)?),
            None => abi::decode_hex(&self.data)
                .ok()
                .and_then(|data| abi::leading_uint(&data).ok()),
        };

        let block_number = match self.block_number.as_deref() {
            Some(raw) => parse_quantity(raw).map_err(|err| err.to_string())?,
            None => 0,
        };

        Ok(MintEvent {
            to,
            token_id: token_id.map(TokenId),
            block_number,
            tx_hash: self.transaction_hash.unwrap_or_default(),
        })
    }
}

async fn block_number(rpc: &JsonRpcClient) -> Result<u64, RpcError> {
    let raw: String = rpc.call("eth_blockNumber", json!([])).await?;
    parse_quantity(&raw)
}

#[async_trait]
impl NftContract for Erc721Contract {
    fn contract_address(&self) -> &str {
        &self.address
    }

    async fn balance_of(&self, owner: &WalletAddress) -> Result<u64, DappError> {
        let data = abi::balance_of_call(owner).map_err(|err| DappError::contract_read("balanceOf", err))?;
        let raw = self.eth_call("balanceOf", data).await?;
        abi::decode_balance(&raw).map_err(|err| DappError::contract_read("balanceOf", err))
    }

    async fn owner_of(&self, token_id: TokenId) -> Result<WalletAddress, DappError> {
        let raw = self.eth_call("ownerOf", abi::owner_of_call(token_id)).await?;
        abi::decode_owner(&raw).map_err(|err| DappError::contract_read("ownerOf", err))
    }

    async fn token_uri(&self, token_id: TokenId) -> Result<String, DappError> {
        let raw = self.eth_call("tokenURI", abi::token_uri_call(token_id)).await?;
        abi::decode_token_uri(&raw).map_err(|err| DappError::contract_read("tokenURI", err))
    }

    async fn subscribe_mint(
        &self,
        to: &WalletAddress,
    ) -> Result<Subscription<Result<MintEvent, DappError>>, DappError> {
        let Some(topic) = self.mint_event_topic.clone() else {
            return Err(DappError::EventSubscription(
                "mint event not configured".to_owned(),
            ));
        };
        let recipient_topic = abi::address_topic(to).map_err(DappError::EventSubscription)?;
        let mut last_seen = block_number(&self.rpc)
            .await
            .map_err(|err| DappError::EventSubscription(err.to_string()))?;

        let rpc = self.rpc.clone();
        let address = self.address.clone();
        let interval = self.poll_interval;
        let (tx, rx) = mpsc::unbounded_channel();

        let producer = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if tx.is_closed() {
                    break;
                }

                let head = match block_number(&rpc).await {
                    Ok(head) => head,
                    Err(err) => {
                        let _ = tx.send(Err(DappError::EventSubscription(err.to_string())));
                        continue;
                    }
                };
                if head <= last_seen {
                    continue;
                }

                let filter = json!([{
                    "address": address,
                    "fromBlock": to_quantity(last_seen + 1),
                    "toBlock": to_quantity(head),
                    "topics": [topic, recipient_topic],
                }]);
                let logs: Vec<LogEntry> = match rpc.call("eth_getLogs", filter).await {
                    Ok(logs) => logs,
                    Err(err) => {
                        let _ = tx.send(Err(DappError::EventSubscription(err.to_string())));
                        continue;
                    }
                };

                debug!(from = last_seen + 1, to = head, count = logs.len(), "polled mint logs");
                last_seen = head;

                for log in logs {
                    let item = log.into_mint_event().map_err(|err| {
                        warn!("undecodable mint log: {}", err);
                        DappError::EventSubscription(err)
                    });
                    if tx.send(item).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Subscription::with_task(rx, producer))
    }
}
