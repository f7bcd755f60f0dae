//! Nomekop Core
//!
//! Wires the wallet session, marketplace and client-local storage together
//! for the dapp front-end. Display layers read [`WalletView`] snapshots and
//! never touch session state directly.

mod config;
mod dapp;
mod error;
mod view;

pub use config::Config;
pub use dapp::Dapp;
pub use error::CoreError;
pub use view::WalletView;

// Re-export core components
pub use nomekop_chain::{
    Address, ChainReader, HttpRpc, Network, ProviderError, ProviderEvent, WalletProvider, U256,
};
pub use nomekop_market::{Listing, ListReceipt, MarketError, Marketplace};
pub use nomekop_session::{Session, SessionController, SessionError, SessionState};
pub use nomekop_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
