use nl_api_types::{SessionResponse, WalletAddress};
use nl_chain_client::{DappError, WalletProvider};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::loader::AssetLoader;

/// Accounts the wallet has authorized. Connected iff non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    accounts: Vec<WalletAddress>,
}

impl WalletSession {
    pub fn new(accounts: Vec<WalletAddress>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &[WalletAddress] {
        &self.accounts
    }

    pub fn is_connected(&self) -> bool {
        !self.accounts.is_empty()
    }

    pub fn primary_account(&self) -> Option<&WalletAddress> {
        self.accounts.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub has_provider: bool,
    pub session: WalletSession,
}

impl SessionState {
    pub fn to_response(&self) -> SessionResponse {
        SessionResponse {
            has_provider: self.has_provider,
            connected: self.session.is_connected(),
            accounts: self.session.accounts().iter().map(|a| a.0.clone()).collect(),
            primary_account: self.session.primary_account().map(|a| a.0.clone()),
            can_connect: self.has_provider && !self.session.is_connected(),
        }
    }
}

fn apply_accounts(state: &watch::Sender<SessionState>, accounts: Vec<WalletAddress>) {
    state.send_modify(|state| {
        if accounts.is_empty() {
            state.session = WalletSession::default();
        } else {
            state.session = WalletSession::new(accounts);
        }
    });
}

/// Follows the wallet provider's authorized accounts.
///
/// Each observed account sequence replaces the session and triggers an
/// asset reload. The account-change listener lives until [`dispose`] or
/// drop.
///
/// [`dispose`]: SessionWatcher::dispose
pub struct SessionWatcher {
    provider: Arc<dyn WalletProvider>,
    loader: Arc<AssetLoader>,
    state: Arc<watch::Sender<SessionState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionWatcher {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        loader: Arc<AssetLoader>,
        state: watch::Sender<SessionState>,
    ) -> Self {
        Self {
            provider,
            loader,
            state: Arc::new(state),
            listener: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn refresh_accounts(&self, accounts: Vec<WalletAddress>) {
        apply_accounts(&self.state, accounts);
        self.loader.spawn_reload();
    }

    /// Probes for a provider, loads its current accounts and starts
    /// listening for account changes. Provider failures leave the watcher
    /// disconnected rather than erroring.
    pub async fn start(&self) {
        let has_provider = self.provider.detect().await;
        self.state.send_modify(|state| state.has_provider = has_provider);
        if !has_provider {
            info!("no wallet provider detected");
            return;
        }

        let accounts = match self.provider.accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!("error reading wallet accounts: {}", err);
                Vec::new()
            }
        };
        self.refresh_accounts(accounts);

        let mut subscription = match self.provider.subscribe_accounts().await {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!("account change notifications unavailable: {}", err);
                return;
            }
        };

        let state = self.state.clone();
        let loader = self.loader.clone();
        let task = tokio::spawn(async move {
            while let Some(accounts) = subscription.next().await {
                info!(count = accounts.len(), "wallet accounts changed");
                apply_accounts(&state, accounts);
                loader.spawn_reload();
            }
        });

        let previous = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Interactive authorization. Updates the session on success; on failure
    /// the session is left as it was.
    pub async fn connect(&self) -> Result<WalletSession, DappError> {
        match self.provider.request_accounts().await {
            Ok(accounts) => {
                apply_accounts(&self.state, accounts);
                Ok(self.state.borrow().session.clone())
            }
            Err(err) => {
                warn!("error connecting wallet: {}", err);
                Err(err)
            }
        }
    }

    /// Stops the account-change listener. Later account changes no longer
    /// reach the loader.
    pub fn dispose(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(listener) = listener {
            listener.abort();
        }
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}
