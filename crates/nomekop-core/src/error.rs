//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] nomekop_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] nomekop_session::SessionError),

    #[error("Marketplace error: {0}")]
    Market(#[from] nomekop_market::MarketError),

    #[error("Provider error: {0}")]
    Provider(#[from] nomekop_chain::ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
