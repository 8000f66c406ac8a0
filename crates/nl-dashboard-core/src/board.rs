use nl_api_types::{AssetView, AssetsResponse, LoanGateView, TokenId, Usd, WalletAddress};

use crate::loan::LoanGate;

/// One owned token as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub token_id: TokenId,
    pub owner: WalletAddress,
    pub metadata_uri: String,
    /// Filled in once the metadata document resolves.
    pub image: Option<String>,
    pub estimated_value: Usd,
    pub loan: LoanGate,
}

impl AssetRecord {
    pub fn new(token_id: TokenId, owner: WalletAddress, metadata_uri: String, estimated_value: Usd) -> Self {
        Self {
            token_id,
            owner,
            metadata_uri,
            image: None,
            estimated_value,
            loan: LoanGate::default(),
        }
    }

    pub fn to_view(&self) -> AssetView {
        AssetView {
            token_id: self.token_id.0,
            owner: self.owner.0.clone(),
            metadata_uri: self.metadata_uri.clone(),
            image: self.image.clone(),
            estimated_value: self.estimated_value,
            loan: LoanGateView {
                pending_amount: self.loan.pending_amount(),
                confirm_enabled: self.loan.confirm_enabled(),
            },
        }
    }
}

/// The published asset list. Replaced as a whole on every successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBoard {
    pub loading: bool,
    /// Load invocation that produced `assets`; 0 before the first publish.
    pub generation: u64,
    /// Sorted by token id.
    pub assets: Vec<AssetRecord>,
}

impl AssetBoard {
    pub fn asset(&self, token_id: TokenId) -> Option<&AssetRecord> {
        self.assets.iter().find(|record| record.token_id == token_id)
    }

    pub fn asset_mut(&mut self, token_id: TokenId) -> Option<&mut AssetRecord> {
        self.assets.iter_mut().find(|record| record.token_id == token_id)
    }

    pub fn to_response(&self) -> AssetsResponse {
        AssetsResponse {
            loading: self.loading,
            generation: self.generation,
            assets: self.assets.iter().map(AssetRecord::to_view).collect(),
        }
    }
}
