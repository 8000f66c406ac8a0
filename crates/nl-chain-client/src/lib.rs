use async_trait::async_trait;
use nl_api_types::{TokenId, TokenMetadata, WalletAddress};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DappError {
    #[error("no wallet provider available")]
    ProviderUnavailable,
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("contract call {call} failed: {reason}")]
    ContractRead { call: &'static str, reason: String },
    #[error("metadata fetch for {uri} failed: {reason}")]
    MetadataFetch { uri: String, reason: String },
    #[error("event subscription failed: {0}")]
    EventSubscription(String),
}

impl DappError {
    pub fn contract_read(call: &'static str, reason: impl std::fmt::Display) -> Self {
        DappError::ContractRead {
            call,
            reason: reason.to_string(),
        }
    }

    pub fn metadata_fetch(uri: &str, reason: impl std::fmt::Display) -> Self {
        DappError::MetadataFetch {
            uri: uri.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// A contract-emitted notice that a token was minted to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEvent {
    pub to: WalletAddress,
    pub token_id: Option<TokenId>,
    pub block_number: u64,
    pub tx_hash: String,
}

/// Receive side of a push notification channel.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// runs its cancel hook, which stops whatever produces the items.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Subscription<T> {
    pub fn new(rx: mpsc::UnboundedReceiver<T>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            rx,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Ties the subscription to a producer task that is aborted on unsubscribe.
    pub fn with_task(rx: mpsc::UnboundedReceiver<T>, producer: JoinHandle<()>) -> Self {
        Self::new(rx, move || producer.abort())
    }

    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Capability probe. Never fails; an unreachable provider is `false`.
    async fn detect(&self) -> bool;
    /// Accounts already authorized, without prompting the user.
    async fn accounts(&self) -> Result<Vec<WalletAddress>, DappError>;
    /// Interactive authorization; may prompt the user.
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, DappError>;
    async fn subscribe_accounts(&self) -> Result<Subscription<Vec<WalletAddress>>, DappError>;
}

#[async_trait]
pub trait NftContract: Send + Sync {
    fn contract_address(&self) -> &str;
    async fn balance_of(&self, owner: &WalletAddress) -> Result<u64, DappError>;
    async fn owner_of(&self, token_id: TokenId) -> Result<WalletAddress, DappError>;
    async fn token_uri(&self, token_id: TokenId) -> Result<String, DappError>;
    /// Mint events addressed to `to`. Delivery errors arrive in-band.
    async fn subscribe_mint(
        &self,
        to: &WalletAddress,
    ) -> Result<Subscription<Result<MintEvent, DappError>>, DappError>;
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<TokenMetadata, DappError>;
}
