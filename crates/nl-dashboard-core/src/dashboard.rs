use nl_api_types::TokenId;
use nl_chain_client::{DappError, MetadataFetcher, NftContract, WalletProvider};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::board::{AssetBoard, AssetRecord};
use crate::loader::{AssetLoader, LoadOutcome, LoaderConfig, LoanError};
use crate::session::{SessionState, SessionWatcher, WalletSession};
use crate::valuation::PricingOracle;

/// Session watcher and asset loader sharing one session channel.
pub struct Dashboard {
    loader: Arc<AssetLoader>,
    watcher: SessionWatcher,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        contract: Arc<dyn NftContract>,
        metadata: Arc<dyn MetadataFetcher>,
        pricing: Arc<dyn PricingOracle>,
        config: LoaderConfig,
    ) -> Self {
        let (state, state_rx) = watch::channel(SessionState::default());
        let loader = AssetLoader::new(provider.clone(), contract, metadata, pricing, config, state_rx);
        let watcher = SessionWatcher::new(provider, loader.clone(), state);
        Self { loader, watcher }
    }

    pub async fn start(&self) {
        self.watcher.start().await;
    }

    pub fn session(&self) -> SessionState {
        self.watcher.state()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.watcher.subscribe()
    }

    pub async fn connect(&self) -> Result<WalletSession, DappError> {
        self.watcher.connect().await
    }

    pub fn board(&self) -> AssetBoard {
        self.loader.board()
    }

    pub fn subscribe_board(&self) -> watch::Receiver<AssetBoard> {
        self.loader.subscribe_board()
    }

    pub fn reload(&self) -> JoinHandle<LoadOutcome> {
        self.loader.spawn_reload()
    }

    pub fn propose_loan(&self, token_id: TokenId, input: &str) -> Result<(bool, AssetRecord), LoanError> {
        self.loader.propose_loan(token_id, input)
    }

    pub fn confirm_loan(&self, token_id: TokenId) -> Result<AssetRecord, LoanError> {
        self.loader.confirm_loan(token_id)
    }

    pub fn loader(&self) -> &Arc<AssetLoader> {
        &self.loader
    }

    pub fn dispose(&self) {
        self.watcher.dispose();
    }
}
