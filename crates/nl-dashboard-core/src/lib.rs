//! Wallet session tracking and owned-NFT loading for the lending dashboard.
//!
//! [`SessionWatcher`] follows the wallet provider's accounts and asks the
//! [`AssetLoader`] to rebuild the [`AssetBoard`] whenever they change.
//! [`Dashboard`] wires the two together around shared client handles.

pub mod board;
pub mod dashboard;
pub mod loader;
pub mod loan;
pub mod session;
pub mod valuation;

#[cfg(test)]
mod test_support;

pub use board::{AssetBoard, AssetRecord};
pub use dashboard::Dashboard;
pub use loader::{AssetLoader, LoadOutcome, LoaderConfig, LoanError, MetadataTasks};
pub use loan::LoanGate;
pub use session::{SessionState, SessionWatcher, WalletSession};
pub use valuation::{PricingOracle, RandomPricing};
