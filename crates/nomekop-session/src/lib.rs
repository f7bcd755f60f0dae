//! Nomekop Wallet Session
//!
//! One controller owns the wallet session for the lifetime of the page:
//! - connect prompts the wallet, auto-reconnect never does
//! - balances are best-effort and never fail a connect
//! - provider notifications update the session in place
//! - observers get whole snapshots through a watch channel, never partial state

mod controller;
mod error;
mod session;

pub use controller::{ControllerConfig, SessionController};
pub use error::SessionError;
pub use session::{Balances, Session, SessionState, TokenBalance};

pub type Result<T> = std::result::Result<T, SessionError>;
