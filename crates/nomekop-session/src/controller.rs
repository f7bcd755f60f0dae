//! Wallet session controller
//!
//! Single writer for the [`Session`]. Every state change goes through one of
//! the operations here and is published to observers as a full snapshot.
//!
//! ```text
//! Disconnected --connect / auto-reconnect--> Connected
//! Connected --accountsChanged([B])---------> Connected (address = B)
//! Connected --chainChanged----------------> Connected (network updated)
//! Connected --disconnect / accounts([])---> Disconnected
//! ```
//!
//! Balance refreshes capture the binding epoch when they start and only
//! commit while it is unchanged, so a slow read for an old account never
//! lands on a newer one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nomekop_chain::units::{format_ether_display, format_units_fixed, DISPLAY_PLACES};
use nomekop_chain::{
    Address, ChainReader, Erc20, Network, ProviderError, ProviderEvent, Signer,
    SubscriptionId, TokenMetadata, WalletProvider,
};
use nomekop_storage::HintStore;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};

use crate::error::SessionError;
use crate::session::{Balances, Session, TokenBalance};
use crate::Result;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Fungible token whose balance is shown next to the native balance
    pub token_contract: Option<Address>,
    /// Chain the dapp is deployed on; a mismatch is advisory only
    pub expected_chain_id: Option<u64>,
    /// Upper bound on an unanswered account request
    pub connect_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            token_contract: None,
            expected_chain_id: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

struct Binding {
    session: Session,
    /// Bumped on every rebind, network change and disconnect
    epoch: u64,
}

pub struct SessionController {
    provider: Option<Arc<dyn WalletProvider>>,
    hints: Arc<dyn HintStore>,
    config: ControllerConfig,
    state: RwLock<Binding>,
    observers: watch::Sender<Session>,
    subscription: Mutex<Option<SubscriptionId>>,
    events_tx: mpsc::UnboundedSender<ProviderEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ProviderEvent>>,
    token_metadata: Mutex<Option<TokenMetadata>>,
    handled_events: AtomicUsize,
}

impl SessionController {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        hints: Arc<dyn HintStore>,
        config: ControllerConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (observers, _) = watch::channel(Session::empty());

        Self {
            provider,
            hints,
            config,
            state: RwLock::new(Binding {
                session: Session::empty(),
                epoch: 0,
            }),
            observers,
            subscription: Mutex::new(None),
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
            token_metadata: Mutex::new(None),
            handled_events: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.clone()
    }

    fn require_provider(&self) -> Result<Arc<dyn WalletProvider>> {
        self.provider.clone().ok_or(SessionError::ProviderUnavailable)
    }

    /// Current snapshot.
    pub fn session(&self) -> Session {
        self.state.read().session.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().session.is_connected()
    }

    /// Receive every future snapshot. The current one is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.observers.subscribe()
    }

    /// Number of provider notifications handled so far.
    pub fn handled_events(&self) -> usize {
        self.handled_events.load(Ordering::Relaxed)
    }

    /// Ask the wallet for account access and bind the first account.
    ///
    /// A rejected or timed-out request leaves the session as it was.
    pub async fn connect(&self) -> Result<Session> {
        let provider = self.require_provider()?;
        let epoch = self.epoch();

        let accounts = tokio::time::timeout(self.config.connect_timeout, provider.request_accounts())
            .await
            .map_err(|_| SessionError::Timeout)??;
        let address = *accounts.first().ok_or(SessionError::NoAccounts)?;

        let session = self.establish(&provider, address, epoch).await?;
        tracing::info!(address = %address, "Wallet connected");

        Ok(session)
    }

    /// Silently restore a session the user already authorized.
    ///
    /// Never prompts and never fails loudly: problems are logged and the
    /// session stays as it was.
    pub async fn try_auto_reconnect(&self) -> Option<Session> {
        let Some(provider) = self.provider.clone() else {
            tracing::debug!("No wallet provider, skipping auto reconnect");
            return None;
        };

        let epoch = self.epoch();

        let lookup = async {
            match provider.authorized_accounts().await {
                Err(ProviderError::Unsupported(_)) => provider.accounts().await,
                other => other,
            }
        };
        let accounts = match tokio::time::timeout(self.config.connect_timeout, lookup).await {
            Ok(Ok(accounts)) => accounts,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Auto reconnect check failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.connect_timeout.as_millis() as u64,
                    "Auto reconnect check timed out"
                );
                return None;
            }
        };

        let address = *accounts.first()?;

        match self.establish(&provider, address, epoch).await {
            Ok(session) => {
                tracing::info!(address = %address, "Wallet reconnected");
                Some(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Auto reconnect failed");
                None
            }
        }
    }

    /// Bind `address` unless the session moved on since `epoch` was read,
    /// e.g. a logout while the wallet was still answering.
    async fn establish(
        &self,
        provider: &Arc<dyn WalletProvider>,
        address: Address,
        epoch: u64,
    ) -> Result<Session> {
        let network = provider.network().await?;

        {
            let mut state = self.state.write();
            if state.epoch != epoch {
                tracing::debug!(address = %address, "Session changed during connect, discarding");
                return Err(SessionError::StaleNotification(address));
            }
            state.session.bind(address, Some(network));
            state.epoch += 1;
            self.observers.send_replace(state.session.clone());
        }

        self.ensure_subscribed(provider);

        if let Err(e) = self.hints.mark_connected() {
            tracing::warn!(error = %e, "Failed to persist reconnect hint");
        }
        if let Err(e) = self.check_network() {
            tracing::warn!(error = %e, "Connected to unexpected network");
        }

        self.refresh_balances().await;

        Ok(self.session())
    }

    fn ensure_subscribed(&self, provider: &Arc<dyn WalletProvider>) {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return;
        }

        match provider.subscribe(self.events_tx.clone()) {
            Ok(id) => {
                tracing::debug!(subscription = %id, "Listening for wallet notifications");
                *subscription = Some(id);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register for wallet notifications");
            }
        }
    }

    /// Advisory network check against the configured chain.
    pub fn check_network(&self) -> Result<()> {
        let Some(expected) = self.config.expected_chain_id else {
            return Ok(());
        };

        match self.state.read().session.network() {
            Some(network) if network.chain_id != expected => Err(SessionError::WrongNetwork {
                expected,
                actual: network.chain_id,
            }),
            _ => Ok(()),
        }
    }

    /// Re-read native and token balances for the bound account.
    ///
    /// Each field is independent: a failed read is logged and leaves the
    /// previous value in place. No-op while disconnected.
    pub async fn refresh_balances(&self) {
        let Some((address, epoch)) = self.binding() else {
            return;
        };
        let Some(provider) = self.provider.clone() else {
            return;
        };

        match provider.balance(address).await {
            Ok(wei) => {
                let native = format_ether_display(wei);
                self.commit_balance(address, epoch, |balances| balances.native = Some(native));
            }
            Err(source) => {
                let err = SessionError::BalanceRead {
                    field: "native",
                    source,
                };
                tracing::warn!(address = %address, error = %err, "Balance read failed");
            }
        }

        let Some(token) = self.config.token_contract else {
            return;
        };

        match self.read_token(provider.as_ref(), Erc20::new(token), address, epoch).await {
            Ok(balance) => {
                self.commit_balance(address, epoch, |balances| balances.token = Some(balance));
            }
            Err(source) => {
                let err = SessionError::BalanceRead {
                    field: "token",
                    source,
                };
                tracing::warn!(address = %address, token = %token, error = %err, "Token read failed");
            }
        }
    }

    async fn read_token(
        &self,
        provider: &dyn WalletProvider,
        token: Erc20,
        owner: Address,
        epoch: u64,
    ) -> std::result::Result<TokenBalance, ProviderError> {
        let raw = token.balance_of(provider, owner).await?;

        let cached = self.token_metadata.lock().clone();
        let metadata = match cached {
            Some(metadata) => metadata,
            None => {
                let metadata = token.metadata(provider).await?;
                let state = self.state.read();
                if state.epoch == epoch {
                    *self.token_metadata.lock() = Some(metadata.clone());
                }
                metadata
            }
        };

        Ok(TokenBalance {
            amount: format_units_fixed(raw, metadata.decimals, DISPLAY_PLACES),
            symbol: metadata.symbol,
            raw,
            decimals: metadata.decimals,
        })
    }

    /// End the session: clear state, drop listeners and the reconnect hint.
    pub fn disconnect(&self) {
        let subscription = self.subscription.lock().take();
        if let (Some(id), Some(provider)) = (subscription, self.provider.as_ref()) {
            provider.unsubscribe(id);
        }

        let was_connected = {
            let mut state = self.state.write();
            let was_connected = state.session.is_connected();
            state.session.clear();
            state.epoch += 1;
            *self.token_metadata.lock() = None;
            self.observers.send_replace(state.session.clone());
            was_connected
        };

        if let Err(e) = self.hints.clear() {
            tracing::warn!(error = %e, "Failed to clear reconnect hint");
        }

        if was_connected {
            tracing::info!("Wallet disconnected");
        }
    }

    /// `accountsChanged` handler. Never prompts.
    pub async fn on_accounts_changed(&self, accounts: Vec<Address>) {
        let Some(&address) = accounts.first() else {
            tracing::info!("Wallet reported no accounts");
            self.disconnect();
            return;
        };

        let changed = {
            let mut state = self.state.write();
            if !state.session.is_connected() {
                None
            } else {
                let changed = state.session.bind(address, None);
                state.epoch += 1;
                self.observers.send_replace(state.session.clone());
                Some(changed)
            }
        };

        match changed {
            None => tracing::debug!(address = %address, "Ignoring account change while disconnected"),
            Some(changed) => {
                if changed {
                    tracing::info!(address = %address, "Active account changed");
                }
                self.refresh_balances().await;
            }
        }
    }

    /// `chainChanged` handler. The bound account is kept.
    pub async fn on_chain_changed(&self, chain_id: u64) {
        if !self.is_connected() {
            tracing::debug!(chain_id, "Ignoring chain change while disconnected");
            return;
        }

        let network = match self.provider.as_ref() {
            Some(provider) => match provider.network().await {
                Ok(network) => network,
                Err(e) => {
                    tracing::warn!(chain_id, error = %e, "Network lookup failed");
                    Network::from_chain_id(chain_id)
                }
            },
            None => Network::from_chain_id(chain_id),
        };

        let updated = {
            let mut state = self.state.write();
            if state.session.is_connected() {
                state.session.network = Some(network);
                state.epoch += 1;
                // Token metadata belongs to the previous chain
                *self.token_metadata.lock() = None;
                self.observers.send_replace(state.session.clone());
                true
            } else {
                false
            }
        };

        if updated {
            tracing::info!(chain_id, "Network changed");
            if let Err(e) = self.check_network() {
                tracing::warn!(error = %e, "Switched to unexpected network");
            }
            self.refresh_balances().await;
        }
    }

    pub async fn handle_event(&self, event: ProviderEvent) {
        self.handled_events.fetch_add(1, Ordering::Relaxed);
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts).await,
            ProviderEvent::ChainChanged(chain_id) => self.on_chain_changed(chain_id).await,
        }
    }

    /// Handle every queued notification in arrival order.
    ///
    /// Returns 0 without waiting while [`run_event_loop`](Self::run_event_loop)
    /// owns the queue.
    pub async fn process_pending_events(&self) -> usize {
        let Ok(mut events) = self.events_rx.try_lock() else {
            tracing::debug!("Event loop running, nothing to drain");
            return 0;
        };
        let mut processed = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event).await;
            processed += 1;
        }
        processed
    }

    /// Handle notifications as they arrive. Runs until the task is dropped.
    pub async fn run_event_loop(&self) {
        let mut events = self.events_rx.lock().await;
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
    }

    /// Signer for the bound account.
    pub async fn signer(&self) -> Result<Arc<dyn Signer>> {
        let provider = self.require_provider()?;
        let address = self.session().address().ok_or(SessionError::NotConnected)?;
        Ok(provider.signer(address).await?)
    }

    fn binding(&self) -> Option<(Address, u64)> {
        let state = self.state.read();
        state.session.address().map(|address| (address, state.epoch))
    }

    fn epoch(&self) -> u64 {
        self.state.read().epoch
    }

    fn commit_balance(&self, address: Address, epoch: u64, apply: impl FnOnce(&mut Balances)) -> bool {
        let mut state = self.state.write();
        if state.epoch != epoch || state.session.address() != Some(address) {
            tracing::debug!(
                error = %SessionError::StaleNotification(address),
                "Dropping balance result"
            );
            return false;
        }

        apply(&mut state.session.balances);
        self.observers.send_replace(state.session.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomekop_chain::mock::MockWallet;
    use nomekop_chain::U256;
    use nomekop_storage::MemoryHintStore;

    const SEPOLIA: u64 = 11155111;

    fn account() -> Address {
        "0xabcd000000000000000000000000000000001234".parse().unwrap()
    }

    fn token() -> Address {
        Address::repeat_byte(0x70)
    }

    fn eth(whole: u64, tenths: u64) -> U256 {
        U256::from(whole * 1_000_000_000_000_000_000 + tenths * 100_000_000_000_000_000)
    }

    struct Harness {
        wallet: MockWallet,
        hints: Arc<MemoryHintStore>,
        controller: SessionController,
    }

    fn harness(wallet: MockWallet, token_contract: Option<Address>) -> Harness {
        let hints = Arc::new(MemoryHintStore::new());
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        let controller = SessionController::new(
            Some(provider),
            hints.clone(),
            ControllerConfig {
                token_contract,
                expected_chain_id: Some(SEPOLIA),
                connect_timeout: Duration::from_secs(5),
            },
        );
        Harness {
            wallet,
            hints,
            controller,
        }
    }

    fn scenario_wallet() -> MockWallet {
        let wallet = MockWallet::with_accounts(vec![account()]);
        wallet.set_balance(account(), U256::from(1_500_000_000_000_000_000u128));
        wallet.set_token(token(), account(), U256::from(250_000_000u64), 6, "PKC");
        wallet
    }

    #[tokio::test]
    async fn test_connect_populates_session() {
        let h = harness(scenario_wallet(), Some(token()));

        let session = h.controller.connect().await.unwrap();

        assert!(session.is_connected());
        assert_eq!(session.address(), Some(account()));
        assert_eq!(
            session.short_address().unwrap().to_lowercase(),
            "0xabcd...1234"
        );
        assert_eq!(session.network().unwrap().name, "sepolia");
        assert_eq!(session.balances().native.as_deref(), Some("1.5000"));
        assert_eq!(
            session.balances().token.as_ref().unwrap().to_string(),
            "250.0000 PKC"
        );
        assert!(h.hints.was_connected().unwrap());
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        let controller = SessionController::new(
            None,
            Arc::new(MemoryHintStore::new()),
            ControllerConfig::default(),
        );

        let err = controller.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::ProviderUnavailable));
        assert!(err.is_user_facing());
        assert_eq!(controller.session(), Session::empty());
    }

    #[tokio::test]
    async fn test_rejection_leaves_session_unchanged() {
        let h = harness(scenario_wallet(), Some(token()));

        h.wallet.set_reject_requests(true);
        let err = h.controller.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::UserRejected));
        assert_eq!(h.controller.session(), Session::empty());
        assert_eq!(h.wallet.active_subscriptions(), 0);

        h.wallet.set_reject_requests(false);
        let before = h.controller.connect().await.unwrap();

        h.wallet.set_reject_requests(true);
        assert!(h.controller.connect().await.is_err());
        assert_eq!(h.controller.session(), before);
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let wallet = scenario_wallet();
        wallet.set_hang_requests(true);

        let hints = Arc::new(MemoryHintStore::new());
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        let controller = SessionController::new(
            Some(provider),
            hints,
            ControllerConfig {
                connect_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );

        let err = controller.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::Timeout));
        assert!(!controller.is_connected());
    }

    #[tokio::test]
    async fn test_token_failure_does_not_fail_connect() {
        let wallet = MockWallet::with_accounts(vec![account()]);
        wallet.set_balance(account(), eth(2, 0));
        // No token calls scripted: every token read reverts
        let h = harness(wallet, Some(token()));

        let session = h.controller.connect().await.unwrap();
        assert!(session.is_connected());
        assert_eq!(session.balances().native.as_deref(), Some("2.0000"));
        assert!(session.balances().token.is_none());
    }

    #[tokio::test]
    async fn test_native_failure_keeps_token() {
        let wallet = scenario_wallet();
        wallet.fail_balance(account());
        let h = harness(wallet, Some(token()));

        let session = h.controller.connect().await.unwrap();
        assert!(session.balances().native.is_none());
        assert_eq!(
            session.balances().token.as_ref().unwrap().amount,
            "250.0000"
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_retains_previous_values() {
        let h = harness(scenario_wallet(), Some(token()));
        h.controller.connect().await.unwrap();

        h.wallet.fail_balance(account());
        h.controller.refresh_balances().await;

        assert_eq!(
            h.controller.session().balances().native.as_deref(),
            Some("1.5000")
        );
    }

    #[tokio::test]
    async fn test_connect_twice_registers_listeners_once() {
        let h = harness(scenario_wallet(), None);

        h.controller.connect().await.unwrap();
        h.controller.connect().await.unwrap();
        assert_eq!(h.wallet.subscribe_calls(), 1);
        assert_eq!(h.wallet.active_subscriptions(), 1);

        h.wallet.emit(ProviderEvent::ChainChanged(SEPOLIA));
        assert_eq!(h.controller.process_pending_events().await, 1);
        assert_eq!(h.controller.handled_events(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_restores_empty_session() {
        let h = harness(scenario_wallet(), Some(token()));
        h.controller.connect().await.unwrap();

        h.wallet.emit(ProviderEvent::ChainChanged(SEPOLIA));
        h.wallet
            .emit(ProviderEvent::AccountsChanged(vec![Address::repeat_byte(0x0b)]));
        h.controller.process_pending_events().await;

        h.controller.disconnect();

        assert_eq!(h.controller.session(), Session::empty());
        assert_eq!(h.wallet.active_subscriptions(), 0);
        assert!(!h.hints.was_connected().unwrap());

        // Safe on an already-empty session
        h.controller.disconnect();
        assert_eq!(h.controller.session(), Session::empty());
    }

    #[tokio::test]
    async fn test_zero_accounts_notification_disconnects() {
        let h = harness(scenario_wallet(), Some(token()));
        h.controller.connect().await.unwrap();

        h.wallet.emit(ProviderEvent::AccountsChanged(vec![]));
        h.controller.process_pending_events().await;

        let session = h.controller.session();
        assert!(!session.is_connected());
        assert!(session.address().is_none());
        assert!(session.network().is_none());
        assert!(session.balances().is_empty());
    }

    #[tokio::test]
    async fn test_account_changes_apply_in_order() {
        let a = Address::repeat_byte(0x0a);
        let b = Address::repeat_byte(0x0b);
        let h = harness(MockWallet::with_accounts(vec![account()]), None);
        h.controller.connect().await.unwrap();

        h.wallet.emit(ProviderEvent::AccountsChanged(vec![a]));
        h.wallet.emit(ProviderEvent::AccountsChanged(vec![b]));
        assert_eq!(h.controller.process_pending_events().await, 2);

        assert_eq!(h.controller.session().address(), Some(b));
        assert_eq!(h.wallet.request_calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_refresh_is_discarded() {
        let a = account();
        let b = Address::repeat_byte(0x0b);

        let wallet = MockWallet::with_accounts(vec![a]);
        wallet.set_balance(a, eth(1, 0));
        wallet.set_balance(b, eth(2, 0));
        let h = harness(wallet, None);
        h.controller.connect().await.unwrap();

        let gate = h.wallet.gate_balance(a);
        h.wallet.set_balance(a, eth(9, 0));

        let slow_refresh = h.controller.refresh_balances();
        let switch_account = async {
            h.controller.on_accounts_changed(vec![b]).await;
            gate.notify_one();
        };
        tokio::join!(slow_refresh, switch_account);

        let session = h.controller.session();
        assert_eq!(session.address(), Some(b));
        assert_eq!(session.balances().native.as_deref(), Some("2.0000"));
    }

    #[tokio::test]
    async fn test_notifications_do_not_connect() {
        let h = harness(scenario_wallet(), None);

        h.controller.on_accounts_changed(vec![account()]).await;
        h.controller.on_chain_changed(1).await;

        assert_eq!(h.controller.session(), Session::empty());
        assert_eq!(h.wallet.request_calls(), 0);
    }

    #[tokio::test]
    async fn test_chain_change_keeps_account() {
        let h = harness(scenario_wallet(), None);
        h.controller.connect().await.unwrap();
        assert!(h.controller.check_network().is_ok());

        h.wallet.set_chain_id(1);
        h.controller.on_chain_changed(1).await;

        let session = h.controller.session();
        assert_eq!(session.address(), Some(account()));
        assert_eq!(session.network().unwrap().chain_id, 1);
        assert!(matches!(
            h.controller.check_network(),
            Err(SessionError::WrongNetwork {
                expected: SEPOLIA,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_wrong_network_does_not_block_connect() {
        let wallet = scenario_wallet();
        wallet.set_chain_id(1);
        let h = harness(wallet, None);

        let session = h.controller.connect().await.unwrap();
        assert!(session.is_connected());
        assert!(h.controller.check_network().is_err());
    }

    #[tokio::test]
    async fn test_auto_reconnect_without_accounts() {
        let h = harness(MockWallet::new(), None);

        assert!(h.controller.try_auto_reconnect().await.is_none());
        assert_eq!(h.controller.session(), Session::empty());
        assert_eq!(h.wallet.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_auto_reconnect_never_prompts() {
        let h = harness(scenario_wallet(), Some(token()));

        let session = h.controller.try_auto_reconnect().await.unwrap();
        assert_eq!(session.address(), Some(account()));
        assert_eq!(session.balances().native.as_deref(), Some("1.5000"));
        assert_eq!(h.wallet.request_calls(), 0);
        assert_eq!(h.wallet.active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn test_auto_reconnect_falls_back_to_passive_listing() {
        let wallet = scenario_wallet();
        wallet.set_authorized_supported(false);
        let h = harness(wallet, None);

        let session = h.controller.try_auto_reconnect().await.unwrap();
        assert_eq!(session.address(), Some(account()));
        assert_eq!(h.wallet.request_calls(), 0);
    }

    #[tokio::test]
    async fn test_auto_reconnect_without_provider() {
        let controller = SessionController::new(
            None,
            Arc::new(MemoryHintStore::new()),
            ControllerConfig::default(),
        );
        assert!(controller.try_auto_reconnect().await.is_none());
    }

    #[tokio::test]
    async fn test_observers_see_whole_snapshots() {
        let h = harness(scenario_wallet(), Some(token()));
        let mut rx = h.controller.subscribe();

        h.controller.connect().await.unwrap();
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, h.controller.session());

        h.controller.disconnect();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Session::empty());
    }

    #[tokio::test]
    async fn test_signer_requires_connection() {
        let h = harness(scenario_wallet(), None);
        assert!(matches!(
            h.controller.signer().await,
            Err(SessionError::NotConnected)
        ));

        h.controller.connect().await.unwrap();
        let signer = h.controller.signer().await.unwrap();
        assert_eq!(signer.address(), account());
    }

    #[tokio::test]
    async fn test_auto_reconnect_gives_up_on_silent_wallet() {
        let wallet = scenario_wallet();
        wallet.set_hang_authorized(true);

        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        let controller = SessionController::new(
            Some(provider),
            Arc::new(MemoryHintStore::new()),
            ControllerConfig {
                connect_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );

        let result = tokio::time::timeout(Duration::from_secs(2), controller.try_auto_reconnect())
            .await
            .expect("auto reconnect should respect the connect timeout");
        assert!(result.is_none());
        assert_eq!(controller.session(), Session::empty());
        assert_eq!(wallet.request_calls(), 0);
    }

    #[tokio::test]
    async fn test_logout_during_connect_wins() {
        let h = harness(scenario_wallet(), Some(token()));
        let gate = h.wallet.gate_network();

        let (result, _) = tokio::join!(h.controller.connect(), async {
            h.controller.disconnect();
            gate.notify_one();
        });

        assert!(matches!(result, Err(SessionError::StaleNotification(_))));
        assert_eq!(h.controller.session(), Session::empty());
        assert!(!h.hints.was_connected().unwrap());
        assert_eq!(h.wallet.active_subscriptions(), 0);

        // A fresh connect afterwards is unaffected
        assert!(h.controller.connect().await.unwrap().is_connected());
    }

    #[tokio::test]
    async fn test_drain_does_not_block_while_loop_runs() {
        let h = harness(scenario_wallet(), None);
        h.controller.connect().await.unwrap();
        h.wallet.emit(ProviderEvent::ChainChanged(SEPOLIA));

        let drained = tokio::time::timeout(Duration::from_secs(2), async {
            tokio::select! {
                _ = h.controller.run_event_loop() => None,
                drained = async {
                    while h.controller.handled_events() == 0 {
                        tokio::task::yield_now().await;
                    }
                    h.controller.process_pending_events().await
                } => Some(drained),
            }
        })
        .await
        .unwrap();

        assert_eq!(drained, Some(0));
        assert_eq!(h.controller.handled_events(), 1);

        // With the loop gone the queue can be drained directly again
        h.wallet.emit(ProviderEvent::ChainChanged(SEPOLIA));
        assert_eq!(h.controller.process_pending_events().await, 1);
    }

    #[tokio::test]
    async fn test_chain_change_reloads_token_metadata() {
        let h = harness(scenario_wallet(), Some(token()));
        h.controller.connect().await.unwrap();

        h.wallet
            .set_token(token(), account(), U256::from(250_000_000u64), 2, "XPKC");
        h.wallet.set_chain_id(1);
        h.controller.on_chain_changed(1).await;

        let token_balance = h.controller.session().balances().token.clone().unwrap();
        assert_eq!(token_balance.to_string(), "2500000.0000 XPKC");
        assert_eq!(token_balance.decimals, 2);
    }

    #[tokio::test]
    async fn test_disconnect_forgets_token_metadata() {
        let h = harness(scenario_wallet(), Some(token()));
        h.controller.connect().await.unwrap();
        h.controller.disconnect();

        h.wallet
            .set_token(token(), account(), U256::from(250_000_000u64), 8, "PKC");
        let session = h.controller.connect().await.unwrap();

        assert_eq!(
            session.balances().token.as_ref().unwrap().amount,
            "2.5000"
        );
    }
}
