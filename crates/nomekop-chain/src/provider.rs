//! Provider, read-only handle and signer interfaces
//!
//! These are the only seams through which the session and marketplace code
//! reach the chain. Browser-injected wallets, HTTP JSON-RPC endpoints and the
//! test mock all implement them.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{EventSink, LogEntry, LogFilter, Network, SubscriptionId, TransactionRequest, TxHash};
use crate::Result;

/// Passive, non-signing access to chain state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// List accounts visible to this handle without prompting anyone.
    async fn accounts(&self) -> Result<Vec<Address>>;

    async fn network(&self) -> Result<Network>;

    /// Native balance in wei.
    async fn balance(&self, address: Address) -> Result<U256>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>>;
}

/// A user-controlled wallet (e.g. an injected browser extension).
#[async_trait]
pub trait WalletProvider: ChainReader {
    /// Ask for account access. May prompt the user and may be rejected.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts the user already authorized, without prompting.
    async fn authorized_accounts(&self) -> Result<Vec<Address>> {
        Err(ProviderError::Unsupported("eth_accounts"))
    }

    async fn signer(&self, address: Address) -> Result<Arc<dyn Signer>>;

    /// Register a sink for `accountsChanged` / `chainChanged` notifications.
    fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId>;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// Authority able to submit state-changing transactions for one account.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;
}
