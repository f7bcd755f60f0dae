//! Session data structure

use chrono::{DateTime, Utc};
use nomekop_chain::units::short_checksum;
use nomekop_chain::{Address, Network, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Disconnected,
    Connected,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Display amount, e.g. `250.0000`
    pub amount: String,
    pub symbol: String,
    pub raw: U256,
    pub decimals: u8,
}

impl std::fmt::Display for TokenBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.symbol)
    }
}

/// Last successfully fetched display values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    /// Native balance, e.g. `1.5000`
    pub native: Option<String>,
    pub token: Option<TokenBalance>,
}

impl Balances {
    pub fn is_empty(&self) -> bool {
        self.native.is_none() && self.token.is_none()
    }
}

/// Wallet connection state for one page lifetime.
///
/// `address` is set exactly when `connected` is true. Fields are private to
/// the crate so only the controller can move between states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub(crate) connected: bool,
    pub(crate) address: Option<Address>,
    pub(crate) network: Option<Network>,
    pub(crate) balances: Balances,
    pub(crate) connected_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn state(&self) -> SessionState {
        if self.connected {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }

    /// `0xAbCd...1234`, or `None` when disconnected.
    pub fn short_address(&self) -> Option<String> {
        self.address.as_ref().map(short_checksum)
    }

    /// Bind an account. Balances belong to the previous account and are
    /// dropped when the address changes. Returns whether it changed.
    pub(crate) fn bind(&mut self, address: Address, network: Option<Network>) -> bool {
        let changed = self.address != Some(address);
        if changed {
            self.balances = Balances::default();
            self.connected_at = Some(Utc::now());
        }
        self.connected = true;
        self.address = Some(address);
        if network.is_some() {
            self.network = network;
        }
        changed
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::empty();
    }
}
