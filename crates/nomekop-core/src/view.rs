//! Wallet menu view model

use nomekop_session::Session;
use serde::Serialize;

pub const CONNECT_LABEL: &str = "CONNECT WALLET";

/// Everything the wallet button and menu render, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletView {
    pub connected: bool,
    pub button_label: String,
    pub address_short: Option<String>,
    /// `1.5000 ETH | 250.0000 PKC`
    pub balance_line: String,
    pub network_label: Option<String>,
    pub wrong_network: bool,
}

impl WalletView {
    pub fn from_session(session: &Session, expected_chain_id: Option<u64>) -> Self {
        if !session.is_connected() {
            return Self::disconnected();
        }

        let address_short = session.short_address();
        let balances = session.balances();

        let mut balance_line = match &balances.native {
            Some(native) => format!("{native} ETH"),
            None => "-".to_string(),
        };
        if let Some(token) = &balances.token {
            balance_line.push_str(&format!(" | {token}"));
        }

        let network = session.network();
        let wrong_network = match (network, expected_chain_id) {
            (Some(network), Some(expected)) => network.chain_id != expected,
            _ => false,
        };

        Self {
            connected: true,
            button_label: address_short
                .clone()
                .unwrap_or_else(|| CONNECT_LABEL.to_string()),
            address_short,
            balance_line,
            network_label: network.map(|n| n.name.to_uppercase()),
            wrong_network,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            button_label: CONNECT_LABEL.to_string(),
            address_short: None,
            balance_line: String::new(),
            network_label: None,
            wrong_network: false,
        }
    }
}

impl Default for WalletView {
    fn default() -> Self {
        Self::disconnected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use nomekop_chain::mock::MockWallet;
    use nomekop_chain::{Address, WalletProvider, U256};
    use nomekop_session::{ControllerConfig, SessionController};
    use nomekop_storage::MemoryHintStore;

    const SEPOLIA: u64 = 11155111;

    fn account() -> Address {
        "0xabcd000000000000000000000000000000001234".parse().unwrap()
    }

    fn token() -> Address {
        Address::repeat_byte(0x70)
    }

    fn controller(wallet: &MockWallet) -> SessionController {
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        SessionController::new(
            Some(provider),
            Arc::new(MemoryHintStore::new()),
            ControllerConfig {
                token_contract: Some(token()),
                expected_chain_id: Some(SEPOLIA),
                connect_timeout: Duration::from_secs(5),
            },
        )
    }

    #[test]
    fn test_disconnected_view() {
        let view = WalletView::from_session(&Session::empty(), Some(SEPOLIA));
        assert!(!view.connected);
        assert_eq!(view.button_label, "CONNECT WALLET");
        assert!(view.address_short.is_none());
        assert!(view.network_label.is_none());
        assert_eq!(view, WalletView::default());
    }

    #[tokio::test]
    async fn test_connected_view() {
        let wallet = MockWallet::with_accounts(vec![account()]);
        wallet.set_balance(account(), U256::from(1_500_000_000_000_000_000u128));
        wallet.set_token(token(), account(), U256::from(250_000_000u64), 6, "PKC");
        let controller = controller(&wallet);

        let session = controller.connect().await.unwrap();
        let view = WalletView::from_session(&session, Some(SEPOLIA));

        assert!(view.connected);
        assert_eq!(view.button_label.to_lowercase(), "0xabcd...1234");
        assert_eq!(view.address_short, Some(view.button_label.clone()));
        assert_eq!(view.balance_line, "1.5000 ETH | 250.0000 PKC");
        assert_eq!(view.network_label.as_deref(), Some("SEPOLIA"));
        assert!(!view.wrong_network);
    }

    #[tokio::test]
    async fn test_view_with_missing_balances() {
        let wallet = MockWallet::with_accounts(vec![account()]);
        wallet.fail_balance(account());
        wallet.set_chain_id(1);
        let controller = controller(&wallet);

        let session = controller.connect().await.unwrap();
        let view = WalletView::from_session(&session, Some(SEPOLIA));

        assert_eq!(view.balance_line, "-");
        assert_eq!(view.network_label.as_deref(), Some("MAINNET"));
        assert!(view.wrong_network);
    }
}
