//! In-memory wallet provider for tests
//!
//! Scripts accounts, chain id, balances and contract return data, records
//! submitted transactions, and can hold individual reads open until a test
//! releases them.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::abi::{IERC20Metadata, INomekopMarket, INomekopNft};
use crate::error::ProviderError;
use crate::provider::{ChainReader, Signer, WalletProvider};
use crate::types::{
    EventSink, LogEntry, LogFilter, Network, ProviderEvent, SubscriptionId, TransactionRequest,
    TxHash,
};
use crate::Result;

#[derive(Default)]
struct MockState {
    accounts: Vec<Address>,
    reject_requests: bool,
    hang_requests: bool,
    hang_authorized: bool,
    authorized_supported: bool,
    chain_id: u64,
    balances: HashMap<Address, U256>,
    failing_balances: Vec<Address>,
    balance_gates: HashMap<Address, Arc<Notify>>,
    network_gate: Option<Arc<Notify>>,
    calls: HashMap<(Address, Bytes), Bytes>,
    logs: Vec<LogEntry>,
    sinks: HashMap<SubscriptionId, EventSink>,
    subscribe_calls: usize,
    request_calls: usize,
    sent: Vec<TransactionRequest>,
}

/// Scriptable stand-in for an injected wallet.
#[derive(Clone)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    /// Sepolia wallet that supports non-interactive `eth_accounts`.
    pub fn new() -> Self {
        let state = MockState {
            chain_id: 11155111,
            authorized_supported: true,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        let wallet = Self::new();
        wallet.set_accounts(accounts);
        wallet
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().accounts = accounts;
    }

    pub fn set_reject_requests(&self, reject: bool) {
        self.state.lock().reject_requests = reject;
    }

    /// Make `request_accounts` never resolve, like an unanswered prompt.
    pub fn set_hang_requests(&self, hang: bool) {
        self.state.lock().hang_requests = hang;
    }

    /// Make `authorized_accounts` never resolve.
    pub fn set_hang_authorized(&self, hang: bool) {
        self.state.lock().hang_authorized = hang;
    }

    pub fn set_authorized_supported(&self, supported: bool) {
        self.state.lock().authorized_supported = supported;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn set_balance(&self, address: Address, wei: U256) {
        self.state.lock().balances.insert(address, wei);
    }

    pub fn fail_balance(&self, address: Address) {
        self.state.lock().failing_balances.push(address);
    }

    /// Hold the next balance reads for `address` until the returned handle is
    /// notified.
    pub fn gate_balance(&self, address: Address) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .balance_gates
            .insert(address, Arc::clone(&gate));
        gate
    }

    /// Hold `network` reads until the returned handle is notified.
    pub fn gate_network(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().network_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn ungate_balance(&self, address: Address) {
        self.state.lock().balance_gates.remove(&address);
    }

    /// Script the raw return data of an `eth_call`.
    pub fn set_call<C: SolCall>(&self, to: Address, call: C, ret: Vec<u8>) {
        self.state
            .lock()
            .calls
            .insert((to, Bytes::from(call.abi_encode())), Bytes::from(ret));
    }

    pub fn set_token(&self, token: Address, owner: Address, balance: U256, decimals: u8, symbol: &str) {
        self.set_call(token, IERC20Metadata::balanceOfCall { owner }, balance.abi_encode());
        self.set_call(token, IERC20Metadata::decimalsCall {}, U256::from(decimals).abi_encode());
        self.set_call(token, IERC20Metadata::symbolCall {}, symbol.to_string().abi_encode());
    }

    pub fn set_listing(&self, market: Address, nft: Address, token_id: U256, seller: Address, price_wei: U256) {
        self.set_call(
            market,
            INomekopMarket::listingsCall {
                nftAddress: nft,
                tokenId: token_id,
            },
            (seller, price_wei).abi_encode_params(),
        );
    }

    pub fn set_token_uri(&self, nft: Address, token_id: U256, uri: &str) {
        self.set_call(
            nft,
            INomekopNft::tokenURICall { tokenId: token_id },
            uri.to_string().abi_encode(),
        );
    }

    pub fn push_log(&self, log: LogEntry) {
        self.state.lock().logs.push(log);
    }

    /// Deliver a notification to every registered sink.
    pub fn emit(&self, event: ProviderEvent) {
        let state = self.state.lock();
        for sink in state.sinks.values() {
            let _ = sink.send(event.clone());
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state.lock().sinks.len()
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().subscribe_calls
    }

    pub fn request_calls(&self) -> usize {
        self.state.lock().request_calls
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().sent.clone()
    }
}

#[async_trait]
impl ChainReader for MockWallet {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.state.lock().accounts.clone())
    }

    async fn network(&self) -> Result<Network> {
        let gate = self.state.lock().network_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(Network::from_chain_id(self.state.lock().chain_id))
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        let gate = self.state.lock().balance_gates.get(&address).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state.lock();
        if state.failing_balances.contains(&address) {
            return Err(ProviderError::Transport("balance unavailable".to_string()));
        }
        Ok(state.balances.get(&address).copied().unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.state
            .lock()
            .calls
            .get(&(to, data))
            .cloned()
            .ok_or_else(|| ProviderError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            })
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        Ok(self
            .state
            .lock()
            .logs
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let (hang, reject, accounts) = {
            let mut state = self.state.lock();
            state.request_calls += 1;
            (state.hang_requests, state.reject_requests, state.accounts.clone())
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if reject {
            return Err(ProviderError::UserRejected);
        }
        Ok(accounts)
    }

    async fn authorized_accounts(&self) -> Result<Vec<Address>> {
        let (hang, result) = {
            let state = self.state.lock();
            let result = if state.authorized_supported {
                Ok(state.accounts.clone())
            } else {
                Err(ProviderError::Unsupported("eth_accounts"))
            };
            (state.hang_authorized, result)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        result
    }

    async fn signer(&self, address: Address) -> Result<Arc<dyn Signer>> {
        Ok(Arc::new(MockSigner {
            address,
            state: Arc::clone(&self.state),
        }))
    }

    fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId> {
        let id = SubscriptionId::new();
        let mut state = self.state.lock();
        state.subscribe_calls += 1;
        state.sinks.insert(id, sink);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.lock().sinks.remove(&id);
    }
}

struct MockSigner {
    address: Address,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let mut state = self.state.lock();
        state.sent.push(tx);
        Ok(B256::with_last_byte(state.sent.len() as u8))
    }
}
