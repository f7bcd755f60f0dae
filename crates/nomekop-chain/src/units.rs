//! Display formatting for amounts and addresses
//!
//! Amounts are formatted with integer arithmetic only, so `1.5 ETH` always
//! renders as `1.5000` regardless of float rounding.

use alloy_primitives::{Address, U256};

pub const ETHER_DECIMALS: u8 = 18;

/// Decimal places shown for every balance in the wallet menu.
pub const DISPLAY_PLACES: u8 = 4;

fn pow10(exp: u8) -> Option<U256> {
    U256::from(10u8).checked_pow(U256::from(exp))
}

/// Format a raw integer amount with `decimals` implied decimals, rounded
/// half-up to `places` fractional digits.
pub fn format_units_fixed(amount: U256, decimals: u8, places: u8) -> String {
    let scaled = if decimals >= places {
        match pow10(decimals - places) {
            Some(divisor) => {
                let half = divisor / U256::from(2u8);
                amount.saturating_add(half) / divisor
            }
            // More decimals than U256 can hold: the value rounds to zero
            None => U256::ZERO,
        }
    } else {
        pow10(places - decimals)
            .map(|factor| amount.saturating_mul(factor))
            .unwrap_or(U256::MAX)
    };

    if places == 0 {
        return scaled.to_string();
    }

    let unit = pow10(places).unwrap_or(U256::MAX);
    let whole = scaled / unit;
    let frac = (scaled % unit).to_string();
    format!("{whole}.{frac:0>width$}", width = places as usize)
}

/// Native balance as shown to the user, e.g. `1.5000`.
pub fn format_ether_display(wei: U256) -> String {
    format_units_fixed(wei, ETHER_DECIMALS, DISPLAY_PLACES)
}

/// `0xABCD...1234` style shortening.
pub fn short_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Checksummed and shortened form of an address.
pub fn short_checksum(address: &Address) -> String {
    short_address(&address.to_checksum(None))
}
