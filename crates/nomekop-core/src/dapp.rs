//! Top-level dapp state container
//!
//! Owns the wallet session controller, the marketplace client and the
//! client-local hint store for one page lifetime.

use std::sync::Arc;

use nomekop_chain::{ChainReader, HttpRpc, WalletProvider};
use nomekop_market::Marketplace;
use nomekop_session::{Session, SessionController};
use nomekop_storage::{Database, HintStore, MemoryHintStore, SqliteHintStore};

use crate::config::Config;
use crate::view::WalletView;
use crate::Result;

pub struct Dapp {
    config: Config,
    /// Absent when no database path is configured
    db: Option<Database>,
    hints: Arc<dyn HintStore>,
    controller: Arc<SessionController>,
    marketplace: Marketplace,
}

impl Dapp {
    /// Wire up the dapp. `provider` is the injected wallet, if any; without
    /// one the marketplace reads through the configured public endpoint.
    pub fn new(config: Config, provider: Option<Arc<dyn WalletProvider>>) -> Result<Self> {
        config.validate()?;

        let db = match &config.database_path {
            Some(path) => Some(Database::open(path)?),
            None => None,
        };
        let hints: Arc<dyn HintStore> = match &db {
            Some(db) => Arc::new(SqliteHintStore::new(db.clone())),
            None => Arc::new(MemoryHintStore::new()),
        };

        let fallback: Option<Arc<dyn ChainReader>> = if provider.is_none() {
            tracing::info!(url = %config.rpc_url, "No wallet injected, using public endpoint");
            Some(Arc::new(HttpRpc::new(config.rpc_url()?)?))
        } else {
            None
        };

        let controller = Arc::new(SessionController::new(
            provider,
            hints.clone(),
            config.controller_config(),
        ));
        let marketplace = Marketplace::new(
            controller.clone(),
            fallback,
            config.nft_contract,
            config.market_contract,
            config.listings_from_block,
        );

        Ok(Self {
            config,
            db,
            hints,
            controller,
            marketplace,
        })
    }

    /// Page-load entry point. Silently restores the previous session when
    /// the reconnect hint is set; never prompts the user.
    pub async fn start(&self) -> Option<Session> {
        let previously_connected = match self.hints.was_connected() {
            Ok(flag) => flag,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable reconnect hint, ignoring");
                false
            }
        };

        if !previously_connected {
            tracing::debug!("No previous session");
            return None;
        }

        self.controller.try_auto_reconnect().await
    }

    /// User-initiated connect from the wallet button.
    pub async fn connect(&self) -> Result<Session> {
        Ok(self.controller.connect().await?)
    }

    /// Logout from the wallet menu.
    pub fn logout(&self) {
        self.controller.disconnect();
    }

    pub fn view(&self) -> WalletView {
        WalletView::from_session(&self.controller.session(), Some(self.config.expected_chain_id))
    }

    /// Drive wallet notifications until the task is dropped.
    pub async fn run(&self) {
        self.controller.run_event_loop().await;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    pub fn marketplace(&self) -> &Marketplace {
        &self.marketplace
    }
}
