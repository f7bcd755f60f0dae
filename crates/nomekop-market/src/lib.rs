//! Nomekop Marketplace
//!
//! Reconstructs the set of open listings from `ItemListed` logs and wraps the
//! user-triggered NFT and marketplace transactions (mint, list, cancel, buy).

mod error;
mod listing;
mod manager;

pub use error::MarketError;
pub use listing::{latest_per_token, Listing};
pub use manager::{ListReceipt, Marketplace};

pub type Result<T> = std::result::Result<T, MarketError>;
