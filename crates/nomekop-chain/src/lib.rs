//! Nomekop Chain Access
//!
//! Everything that talks to the chain goes through the narrow interfaces in
//! this crate: an injected wallet provider, a read-only RPC handle, and the
//! three fixed contracts (fungible token, NFT, marketplace).

pub mod abi;
mod contracts;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod provider;
mod rpc;
mod types;
pub mod units;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use contracts::{
    encode_item_listed, Erc20, MarketContract, MarketListing, NftContract, TokenMetadata,
};
pub use error::ProviderError;
pub use provider::{ChainReader, Signer, WalletProvider};
pub use rpc::HttpRpc;
pub use types::{
    chain_name, EventSink, ItemListed, LogEntry, LogFilter, Network, ProviderEvent,
    SubscriptionId, TransactionRequest, TxHash,
};

pub type Result<T> = std::result::Result<T, ProviderError>;
