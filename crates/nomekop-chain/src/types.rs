//! Shared chain-facing types

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

pub type TxHash = B256;

/// Chain identity as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
}

impl Network {
    pub fn from_chain_id(chain_id: u64) -> Self {
        Self {
            name: chain_name(chain_id).to_string(),
            chain_id,
        }
    }
}

pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        11155111 => "sepolia",
        17000 => "holesky",
        31337 => "anvil",
        _ => "unknown",
    }
}

/// Notifications pushed by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

pub type EventSink = mpsc::UnboundedSender<ProviderEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `eth_getLogs` filter. `topics[i] == None` matches anything in slot `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Option<Address>,
    pub topics: [Option<B256>; 4],
    pub from_block: u64,
    /// `None` means latest
    pub to_block: Option<u64>,
}

impl LogFilter {
    pub fn matches(&self, log: &LogEntry) -> bool {
        if let Some(address) = self.address {
            if log.address != address {
                return false;
            }
        }
        if let Some(block) = log.block_number {
            if block < self.from_block || self.to_block.is_some_and(|to| block > to) {
                return false;
            }
        }
        self.topics.iter().enumerate().all(|(i, topic)| match topic {
            Some(expected) => log.topics.get(i) == Some(expected),
            None => true,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
}

/// Decoded marketplace `ItemListed` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemListed {
    pub nft_address: Address,
    pub token_id: U256,
    pub seller: Address,
    pub price_wei: U256,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}
