use nl_api_types::{IndexBase, TokenId, WalletAddress};
use nl_chain_client::{DappError, MetadataFetcher, NftContract, WalletProvider};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::board::{AssetBoard, AssetRecord};
use crate::session::SessionState;
use crate::valuation::PricingOracle;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderConfig {
    pub index_base: IndexBase,
    /// Reload whenever the contract reports a mint to the primary account.
    pub watch_mints: bool,
}

/// Metadata fetches started for one published list.
#[derive(Debug, Default)]
pub struct MetadataTasks(Vec<JoinHandle<()>>);

impl MetadataTasks {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Waits for every fetch to settle. Fetch failures never surface here.
    pub async fn join(self) {
        for task in self.0 {
            if let Err(err) = task.await {
                warn!("metadata task ended abnormally: {}", err);
            }
        }
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// No connected account; an empty list was published.
    Disconnected,
    Published {
        generation: u64,
        count: usize,
        metadata: MetadataTasks,
    },
    /// A newer load started before this one finished; its result was dropped.
    Superseded { generation: u64 },
    /// A read failed; the previous list was left in place.
    Failed(DappError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    UnknownToken(TokenId),
    ConfirmDisabled(TokenId),
}

impl std::fmt::Display for LoanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanError::UnknownToken(id) => write!(f, "token {id} is not on the board"),
            LoanError::ConfirmDisabled(id) => write!(f, "no accepted loan amount pending for token {id}"),
        }
    }
}

impl std::error::Error for LoanError {}

struct MintWatch {
    account: WalletAddress,
    task: JoinHandle<()>,
}

impl Drop for MintWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Rebuilds the asset board from the contract for the session's account.
///
/// Every call to [`AssetLoader::load`] takes a new generation number; only
/// the newest generation may publish or clear the loading flag, so an
/// overlapping older load can never overwrite a newer list.
pub struct AssetLoader {
    provider: Arc<dyn WalletProvider>,
    contract: Arc<dyn NftContract>,
    metadata: Arc<dyn MetadataFetcher>,
    pricing: Arc<dyn PricingOracle>,
    config: LoaderConfig,
    session: watch::Receiver<SessionState>,
    board: Arc<watch::Sender<AssetBoard>>,
    generation: AtomicU64,
    mint_watch: Mutex<Option<MintWatch>>,
}

impl AssetLoader {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        contract: Arc<dyn NftContract>,
        metadata: Arc<dyn MetadataFetcher>,
        pricing: Arc<dyn PricingOracle>,
        config: LoaderConfig,
        session: watch::Receiver<SessionState>,
    ) -> Arc<Self> {
        let (board, _) = watch::channel(AssetBoard::default());
        Arc::new(Self {
            provider,
            contract,
            metadata,
            pricing,
            config,
            session,
            board: Arc::new(board),
            generation: AtomicU64::new(0),
            mint_watch: Mutex::new(None),
        })
    }

    pub fn board(&self) -> AssetBoard {
        self.board.borrow().clone()
    }

    pub fn subscribe_board(&self) -> watch::Receiver<AssetBoard> {
        self.board.subscribe()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Runs [`AssetLoader::load`] in the background.
    pub fn spawn_reload(self: &Arc<Self>) -> JoinHandle<LoadOutcome> {
        let loader = self.clone();
        tokio::spawn(async move { loader.load().await })
    }

    pub async fn load(self: &Arc<Self>) -> LoadOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let connected = self.session.borrow().session.is_connected();

        if !connected {
            debug!(generation, "no connected account; clearing asset board");
            *self.mint_watch.lock().await = None;
            self.publish(generation, Vec::new());
            return LoadOutcome::Disconnected;
        }

        self.raise_loading(generation);

        match self.enumerate().await {
            Ok((account, records)) => {
                let count = records.len();
                let targets: Vec<(TokenId, String)> = records
                    .iter()
                    .map(|record| (record.token_id, record.metadata_uri.clone()))
                    .collect();

                if !self.publish(generation, records) {
                    debug!(generation, "load superseded; result dropped");
                    return LoadOutcome::Superseded { generation };
                }
                info!(generation, account = %account, count, "asset board published");

                let metadata = self.spawn_metadata(generation, targets);
                self.ensure_mint_watch(account).await;
                LoadOutcome::Published {
                    generation,
                    count,
                    metadata,
                }
            }
            Err(err) => {
                error!(generation, "error fetching NFTs: {}", err);
                self.board.send_if_modified(|board| {
                    if !self.is_current(generation) || !board.loading {
                        return false;
                    }
                    board.loading = false;
                    true
                });
                LoadOutcome::Failed(err)
            }
        }
    }

    async fn enumerate(&self) -> Result<(WalletAddress, Vec<AssetRecord>), DappError> {
        let accounts = self.provider.request_accounts().await?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| DappError::AuthorizationDenied("no account granted".to_owned()))?;

        let count = self.contract.balance_of(&account).await?;
        info!(account = %account, count, "enumerating owned tokens");

        let mut records = Vec::new();
        for token_id in self.config.index_base.token_ids(count) {
            let (owner, metadata_uri) = tokio::try_join!(
                self.contract.owner_of(token_id),
                self.contract.token_uri(token_id),
            )?;
            let estimated_value = self.pricing.estimate(token_id);
            records.push(AssetRecord::new(token_id, owner, metadata_uri, estimated_value));
        }
        records.sort_by_key(|record| record.token_id);

        Ok((account, records))
    }

    /// A load that has already been overtaken leaves the flag alone.
    fn raise_loading(&self, generation: u64) -> bool {
        self.board.send_if_modified(|board| {
            if !self.is_current(generation) || board.loading {
                return false;
            }
            board.loading = true;
            true
        })
    }

    fn publish(&self, generation: u64, assets: Vec<AssetRecord>) -> bool {
        let mut assets = Some(assets);
        self.board.send_if_modified(|board| {
            if !self.is_current(generation) || board.generation > generation {
                return false;
            }
            board.generation = generation;
            board.assets = assets.take().unwrap_or_default();
            board.loading = false;
            true
        })
    }

    fn spawn_metadata(&self, generation: u64, targets: Vec<(TokenId, String)>) -> MetadataTasks {
        let tasks = targets
            .into_iter()
            .map(|(token_id, uri)| {
                let fetcher = self.metadata.clone();
                let board = self.board.clone();
                tokio::spawn(async move {
                    match fetcher.fetch(&uri).await {
                        Ok(metadata) => {
                            board.send_if_modified(|board| {
                                if board.generation != generation {
                                    return false;
                                }
                                match board.asset_mut(token_id) {
                                    Some(record) => {
                                        record.image = Some(metadata.image);
                                        true
                                    }
                                    None => false,
                                }
                            });
                        }
                        Err(err) => warn!(token_id = %token_id, "image left unresolved: {}", err),
                    }
                })
            })
            .collect();
        MetadataTasks(tasks)
    }

    async fn ensure_mint_watch(self: &Arc<Self>, account: WalletAddress) {
        if !self.config.watch_mints {
            return;
        }

        let mut slot = self.mint_watch.lock().await;
        if slot.as_ref().is_some_and(|watch| watch.account.same_account(&account)) {
            return;
        }
        *slot = None;

        let mut subscription = match self.contract.subscribe_mint(&account).await {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(account = %account, "mint events unavailable: {}", err);
                return;
            }
        };

        let loader: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            while let Some(item) = subscription.next().await {
                match item {
                    Ok(event) => {
                        info!(to = %event.to, block = event.block_number, "mint event; reloading assets");
                        let Some(loader) = loader.upgrade() else {
                            break;
                        };
                        loader.spawn_reload();
                    }
                    Err(err) => error!("mint event error: {}", err),
                }
            }
        });
        *slot = Some(MintWatch { account, task });
    }

    /// Stages `input` as the loan amount for `token_id`.
    /// Returns whether it was accepted, with the record after the change.
    pub fn propose_loan(&self, token_id: TokenId, input: &str) -> Result<(bool, AssetRecord), LoanError> {
        let mut outcome = Err(LoanError::UnknownToken(token_id));
        self.board.send_if_modified(|board| {
            let Some(record) = board.asset_mut(token_id) else {
                return false;
            };
            let accepted = record.loan.propose(input, record.estimated_value);
            outcome = Ok((accepted, record.clone()));
            true
        });
        outcome
    }

    /// Applies the pending loan amount for `token_id` to its estimated value.
    pub fn confirm_loan(&self, token_id: TokenId) -> Result<AssetRecord, LoanError> {
        let mut outcome = Err(LoanError::UnknownToken(token_id));
        self.board.send_if_modified(|board| {
            let Some(record) = board.asset_mut(token_id) else {
                return false;
            };
            match record.loan.confirm(record.estimated_value) {
                Some(remaining) => {
                    record.estimated_value = remaining;
                    outcome = Ok(record.clone());
                    true
                }
                None => {
                    outcome = Err(LoanError::ConfirmDisabled(token_id));
                    false
                }
            }
        });
        outcome
    }
}
