//! Listing reconstruction from event logs

use std::collections::BTreeMap;

use alloy_primitives::utils::format_ether;
use nomekop_chain::{Address, ItemListed, U256};
use serde::{Deserialize, Serialize};

/// An open marketplace listing, confirmed against current contract state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub token_id: U256,
    pub seller: Address,
    pub price_wei: U256,
    /// Price in ether without trailing zeros, e.g. `0.25`
    pub price_eth: String,
}

impl Listing {
    pub fn new(token_id: U256, seller: Address, price_wei: U256) -> Self {
        Self {
            token_id,
            seller,
            price_wei,
            price_eth: trim_ether(&format_ether(price_wei)),
        }
    }
}

fn trim_ether(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    let trimmed = formatted.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Keep the most recent event per token. Events are assumed to be in log
/// order, so later entries win.
pub fn latest_per_token(events: Vec<ItemListed>) -> BTreeMap<U256, ItemListed> {
    let mut latest = BTreeMap::new();
    for event in events {
        latest.insert(event.token_id, event);
    }
    latest
}
