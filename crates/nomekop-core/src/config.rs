//! Dapp configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::address;
use nomekop_chain::Address;
use nomekop_session::ControllerConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;
use crate::Result;

/// Sepolia
pub const DEFAULT_CHAIN_ID: u64 = 11155111;

const DEFAULT_NFT_CONTRACT: Address = address!("BDDC9D6dB298f7486f73abD06083d4B84CDd7521");
const DEFAULT_TOKEN_CONTRACT: Address = address!("e909fB039ad0e5a2457ad4Ed9bb8393E926C9CC8");
const DEFAULT_MARKET_CONTRACT: Address = address!("E21f02Ba72524dd567aC5d56619feFA42C8EC03F");

const DEFAULT_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NFT collection traded on the marketplace
    pub nft_contract: Address,
    /// Fungible token shown in the wallet menu
    pub token_contract: Option<Address>,
    pub market_contract: Address,
    /// Chain the contracts are deployed on
    pub expected_chain_id: u64,
    /// Public endpoint used when no wallet is injected
    pub rpc_url: String,
    /// SQLite file for client-local settings; in-memory when unset
    pub database_path: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    /// Marketplace deployment block, to bound log queries
    pub listings_from_block: u64,
}

impl Config {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.rpc_url()?;
        if self.connect_timeout_secs == 0 {
            return Err(CoreError::Config(
                "connect_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> Result<Url> {
        Url::parse(&self.rpc_url)
            .map_err(|e| CoreError::Config(format!("invalid rpc_url {}: {e}", self.rpc_url)))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            token_contract: self.token_contract,
            expected_chain_id: Some(self.expected_chain_id),
            connect_timeout: self.connect_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nft_contract: DEFAULT_NFT_CONTRACT,
            token_contract: Some(DEFAULT_TOKEN_CONTRACT),
            market_contract: DEFAULT_MARKET_CONTRACT,
            expected_chain_id: DEFAULT_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            database_path: None,
            connect_timeout_secs: 60,
            listings_from_block: 0,
        }
    }
}
