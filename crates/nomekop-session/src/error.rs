//! Session error types

use nomekop_chain::{Address, ProviderError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No wallet provider detected")]
    ProviderUnavailable,

    #[error("User rejected the connection request")]
    UserRejected,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Wrong network: expected chain {expected}, connected to {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Failed to read {field} balance: {source}")]
    BalanceRead {
        field: &'static str,
        source: ProviderError,
    },

    #[error("Discarded stale result for {0}")]
    StaleNotification(Address),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Wallet request timed out")]
    Timeout,

    #[error("Provider error: {0}")]
    Provider(ProviderError),
}

impl SessionError {
    /// Errors the user should see, as opposed to ones only worth logging.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            SessionError::BalanceRead { .. } | SessionError::StaleNotification(_)
        )
    }
}

impl From<ProviderError> for SessionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => SessionError::UserRejected,
            ProviderError::Timeout => SessionError::Timeout,
            other => SessionError::Provider(other),
        }
    }
}
