//! In-memory stand-ins for the wallet provider, contract and metadata host.

use async_trait::async_trait;
use nl_api_types::{TokenId, TokenMetadata, Usd, WalletAddress};
use nl_chain_client::{DappError, MetadataFetcher, MintEvent, NftContract, Subscription, WalletProvider};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::valuation::PricingOracle;

pub(crate) fn addr(n: u8) -> WalletAddress {
    WalletAddress(format!("0x{:040x}", n))
}

pub(crate) async fn wait_for<T>(
    rx: &mut watch::Receiver<T>,
    predicate: impl FnMut(&T) -> bool,
) -> anyhow::Result<()> {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate)).await??;
    Ok(())
}

pub(crate) struct MockProvider {
    present: bool,
    accounts: Mutex<Vec<WalletAddress>>,
    deny_requests: AtomicBool,
    fail_account_reads: AtomicBool,
    requests: AtomicUsize,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Vec<WalletAddress>>>>,
    unsubscribed: Arc<AtomicBool>,
}

impl MockProvider {
    pub(crate) fn with_accounts(accounts: Vec<WalletAddress>) -> Self {
        Self {
            present: true,
            accounts: Mutex::new(accounts),
            deny_requests: AtomicBool::new(false),
            fail_account_reads: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
            subscribers: Mutex::new(Vec::new()),
            unsubscribed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn absent() -> Self {
        Self {
            present: false,
            ..Self::with_accounts(Vec::new())
        }
    }

    pub(crate) fn deny_requests(&self, deny: bool) {
        self.deny_requests.store(deny, Ordering::SeqCst);
    }

    pub(crate) fn fail_account_reads(&self, fail: bool) {
        self.fail_account_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub(crate) fn unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::SeqCst)
    }

    /// Simulates the wallet switching accounts.
    pub(crate) fn push_accounts(&self, accounts: Vec<WalletAddress>) {
        *self.accounts.lock().unwrap() = accounts.clone();
        for subscriber in self.subscribers.lock().unwrap().iter() {
            let _ = subscriber.send(accounts.clone());
        }
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn detect(&self) -> bool {
        self.present
    }

    async fn accounts(&self) -> Result<Vec<WalletAddress>, DappError> {
        if !self.present {
            return Err(DappError::ProviderUnavailable);
        }
        if self.fail_account_reads.load(Ordering::SeqCst) {
            return Err(DappError::ProviderUnavailable);
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, DappError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.present {
            return Err(DappError::ProviderUnavailable);
        }
        if self.deny_requests.load(Ordering::SeqCst) {
            return Err(DappError::AuthorizationDenied("User rejected the request.".to_owned()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn subscribe_accounts(&self) -> Result<Subscription<Vec<WalletAddress>>, DappError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        let flag = self.unsubscribed.clone();
        Ok(Subscription::new(rx, move || flag.store(true, Ordering::SeqCst)))
    }
}

pub(crate) struct MockContract {
    owner: WalletAddress,
    balance: AtomicU64,
    scripted: Mutex<VecDeque<(u64, Duration)>>,
    failing: Mutex<HashSet<u64>>,
    calls: AtomicUsize,
    mint_subscriptions: AtomicUsize,
    mint_senders: Mutex<Vec<mpsc::UnboundedSender<Result<MintEvent, DappError>>>>,
}

impl MockContract {
    /// Contract where `owner` holds `balance` tokens and every id resolves.
    pub(crate) fn owning(owner: WalletAddress, balance: u64) -> Self {
        Self {
            owner,
            balance: AtomicU64::new(balance),
            scripted: Mutex::new(VecDeque::new()),
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            mint_subscriptions: AtomicUsize::new(0),
            mint_senders: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn uri_for(token_id: TokenId) -> String {
        format!("https://meta.test/{}.json", token_id.0)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_balance(&self, balance: u64) {
        self.balance.store(balance, Ordering::SeqCst);
    }

    /// Queues a one-shot balance answer delivered after `delay`.
    pub(crate) fn script_balance(&self, balance: u64, delay: Duration) {
        self.scripted.lock().unwrap().push_back((balance, delay));
    }

    pub(crate) fn fail_owner_of(&self, token_id: TokenId) {
        self.failing.lock().unwrap().insert(token_id.0);
    }

    pub(crate) fn mint_subscriptions(&self) -> usize {
        self.mint_subscriptions.load(Ordering::SeqCst)
    }

    pub(crate) fn emit_mint(&self, to: WalletAddress, token_id: TokenId) {
        for sender in self.mint_senders.lock().unwrap().iter() {
            let _ = sender.send(Ok(MintEvent {
                to: to.clone(),
                token_id: Some(token_id),
                block_number: 1,
                tx_hash: "0xmint".to_owned(),
            }));
        }
    }
}

#[async_trait]
impl NftContract for MockContract {
    fn contract_address(&self) -> &str {
        "0x00000000000000000000000000000000000000c0"
    }

    async fn balance_of(&self, owner: &WalletAddress) -> Result<u64, DappError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.scripted.lock().unwrap().pop_front();
        if let Some((balance, delay)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(balance);
        }
        if !owner.same_account(&self.owner) {
            return Ok(0);
        }
        Ok(self.balance.load(Ordering::SeqCst))
    }

    async fn owner_of(&self, token_id: TokenId) -> Result<WalletAddress, DappError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&token_id.0) {
            return Err(DappError::contract_read("ownerOf", "execution reverted"));
        }
        Ok(self.owner.clone())
    }

    async fn token_uri(&self, token_id: TokenId) -> Result<String, DappError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::uri_for(token_id))
    }

    async fn subscribe_mint(
        &self,
        _to: &WalletAddress,
    ) -> Result<Subscription<Result<MintEvent, DappError>>, DappError> {
        self.mint_subscriptions.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.mint_senders.lock().unwrap().push(tx);
        Ok(Subscription::new(rx, || {}))
    }
}

#[derive(Default)]
pub(crate) struct MockFetcher {
    failing: HashSet<String>,
}

impl MockFetcher {
    pub(crate) fn failing(uris: &[String]) -> Self {
        Self {
            failing: uris.iter().cloned().collect(),
        }
    }

    pub(crate) fn image_for(uri: &str) -> String {
        format!("{uri}.png")
    }
}

#[async_trait]
impl MetadataFetcher for MockFetcher {
    async fn fetch(&self, uri: &str) -> Result<TokenMetadata, DappError> {
        if self.failing.contains(uri) {
            return Err(DappError::metadata_fetch(uri, "connection reset"));
        }
        Ok(TokenMetadata {
            image: Self::image_for(uri),
            name: None,
            description: None,
            attributes: Vec::new(),
        })
    }
}

pub(crate) struct FixedPricing(pub Usd);

impl PricingOracle for FixedPricing {
    fn estimate(&self, _token_id: TokenId) -> Usd {
        self.0
    }
}
