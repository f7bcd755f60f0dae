//! Marketplace error types

use nomekop_chain::{ProviderError, U256};
use nomekop_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Connect a wallet first")]
    NotConnected,

    #[error("Token #{0} is not listed")]
    NotListed(U256),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("No chain access: neither a wallet nor an RPC endpoint is configured")]
    NoReader,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Session error: {0}")]
    Session(SessionError),
}

impl From<SessionError> for MarketError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotConnected | SessionError::ProviderUnavailable => {
                MarketError::NotConnected
            }
            other => MarketError::Session(other),
        }
    }
}
