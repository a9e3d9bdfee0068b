// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Amount parsing and display formatting.
//!
//! Everything here is pure: ether strings to wei and back, shortened
//! addresses for tables, and the fee/gas renderings used by the history views.

use alloy::primitives::U256;

/// Decimals of the native token on both CoinStir chains.
pub const ETH_DECIMALS: u8 = 18;

/// Errors produced while parsing user-supplied amounts or hex words.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    #[error("Too many decimal places (max {0})")]
    TooManyDecimals(u8),

    #[error("Amount overflow")]
    Overflow,

    #[error("Invalid hex value: {0}")]
    InvalidHex(String),
}

/// Prepend `0` to amounts typed with a bare leading decimal point.
///
/// Wallet input such as `.01` is signed as `0.01`, which is the exact string
/// the enclave re-hashes when it verifies the transfer.
pub fn format_number_string(amount: &str) -> String {
    if amount.starts_with('.') {
        format!("0{amount}")
    } else {
        amount.to_string()
    }
}

/// Shorten an address for display: first 5 characters, `...`, characters 38..42.
///
/// A 42-character address always yields 12 characters.
pub fn format_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = address.chars().collect();
    let slice = |from: usize, to: usize| -> String {
        let from = from.min(chars.len());
        let to = to.min(chars.len());
        chars[from..to].iter().collect()
    };
    format!("{}...{}", slice(0, 5), slice(38, 42))
}

/// Take the low 40 hex characters of an ABI word and prefix them with `0x`.
pub fn hex_to_address(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let start = chars.len().saturating_sub(40);
    format!("0x{}", chars[start..].iter().collect::<String>())
}

/// Parse a hex string (with or without `0x`) as a 256-bit unsigned integer.
pub fn hex_to_uint256(hex: &str) -> Result<U256, FormatError> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.is_empty() {
        return Err(FormatError::InvalidHex(hex.to_string()));
    }
    U256::from_str_radix(digits, 16).map_err(|_| FormatError::InvalidHex(hex.to_string()))
}

/// Parse a human-readable amount to its smallest unit.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5" or ".01")
/// * `decimals` - Number of decimals (18 for ETH)
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, FormatError> {
    let amount = format_number_string(amount.trim());
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 || parts[0].is_empty() {
        return Err(FormatError::InvalidAmount(amount.clone()));
    }

    let whole = U256::from_str_radix(parts[0], 10)
        .map_err(|_| FormatError::InvalidAmount(amount.clone()))?;

    let decimal_part = if parts.len() == 2 && !parts[1].is_empty() {
        let dec_str = parts[1];
        if dec_str.len() > decimals as usize {
            return Err(FormatError::TooManyDecimals(decimals));
        }
        // Pad with zeros to match decimals
        let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
        U256::from_str_radix(&padded, 10).map_err(|_| FormatError::InvalidAmount(amount.clone()))?
    } else {
        U256::ZERO
    };

    let multiplier = U256::from(10u64).pow(U256::from(decimals));
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(decimal_part))
        .ok_or(FormatError::Overflow)
}

/// Parse an ether amount to wei.
pub fn parse_ether(amount: &str) -> Result<U256, FormatError> {
    parse_amount(amount, ETH_DECIMALS)
}

/// Format wei (or token units) to a human-readable amount without trailing zeros.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// Format wei as ether with a fixed number of decimal places, rounding half up.
pub fn format_eth_fixed(wei: U256, places: u8) -> String {
    let one_eth = U256::from(10u64).pow(U256::from(ETH_DECIMALS));
    let scale = U256::from(10u64).pow(U256::from(places));
    let rounded = (wei.saturating_mul(scale) + one_eth / U256::from(2u64)) / one_eth;

    let whole = rounded / scale;
    if places == 0 {
        return whole.to_string();
    }
    let frac = rounded % scale;
    format!("{}.{:0>width$}", whole, frac.to_string(), width = places as usize)
}

/// Ether amount for table cells (4 decimals).
pub fn format_eth_amount(wei: U256) -> String {
    format_eth_fixed(wei, 4)
}

/// Fee cell for the account history; zero stays a bare `0`.
pub fn format_fee(fee_wei: U256) -> String {
    if fee_wei.is_zero() {
        return "0".to_string();
    }
    format_eth_fixed(fee_wei, 4)
}

/// Fee cell for the admin history.
pub fn format_fee_for_admin(fee_wei: U256) -> String {
    if fee_wei.is_zero() {
        return "N/A".to_string();
    }
    format_eth_fixed(fee_wei, 6)
}

/// Gas cell for the admin history.
pub fn format_gas_for_admin(gas_wei: U256) -> String {
    if gas_wei.is_zero() {
        return "N/A".to_string();
    }
    format_eth_fixed(gas_wei, 15)
}

/// Dollar value of an ether amount at the given price.
pub fn format_usd_value(eth_amount: f64, eth_price: f64) -> String {
    format!("{:.2}", eth_amount * eth_price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_string_gains_leading_zero() {
        assert_eq!(format_number_string(".01"), "0.01");
        assert_eq!(format_number_string("0.01"), "0.01");
        assert_eq!(format_number_string("3"), "3");
    }

    #[test]
    fn address_is_shortened_to_twelve_chars() {
        let addr = "0x4d48c82CA673ae0816881113EF90ba46ccfD62cc";
        let short = format_address(addr);
        assert_eq!(short, "0x4d4...62cc");
        assert_eq!(short.len(), 12);
        assert_eq!(format_address(""), "");
    }

    #[test]
    fn short_input_is_clamped() {
        assert_eq!(format_address("0x12"), "0x12...");
    }

    #[test]
    fn hex_word_to_address() {
        let word = "0000000000000000000000004d48c82ca673ae0816881113ef90ba46ccfd62cc";
        assert_eq!(word.len(), 64);
        assert_eq!(hex_to_address(word), "0x4d48c82ca673ae0816881113ef90ba46ccfd62cc");
    }

    #[test]
    fn hex_to_uint256_parses_words() {
        assert_eq!(hex_to_uint256("0x0a").unwrap(), U256::from(10u64));
        assert_eq!(
            hex_to_uint256("00000000000000000000000000000000000000000000000000000000000000ff").unwrap(),
            U256::from(255u64)
        );
        assert!(hex_to_uint256("0x").is_err());
        assert!(hex_to_uint256("zz").is_err());
    }

    #[test]
    fn test_parse_amount_whole() {
        let result = parse_amount("1", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_leading_point() {
        assert_eq!(parse_ether(".01").unwrap(), U256::from(10_000_000_000_000_000u64));
        assert_eq!(parse_ether(".00003").unwrap(), U256::from(30_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(parse_ether("1.2.3"), Err(FormatError::InvalidAmount(_))));
        assert!(matches!(parse_ether("abc"), Err(FormatError::InvalidAmount(_))));
        assert!(matches!(parse_amount("0.1234567", 6), Err(FormatError::TooManyDecimals(6))));
    }

    #[test]
    fn test_format_amount() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_amount(one_and_half, 18), "1.5");
        assert_eq!(format_amount(U256::ZERO, 18), "0");
    }

    #[test]
    fn fixed_formatting_rounds_half_up() {
        // 0.00005 ETH rounds up to 0.0001
        assert_eq!(format_eth_amount(U256::from(50_000_000_000_000u64)), "0.0001");
        // 0.00004999 ETH rounds down
        assert_eq!(format_eth_amount(U256::from(49_990_000_000_000u64)), "0.0000");
        assert_eq!(format_eth_amount(U256::from(1_000_000_000_000_000_000u64)), "1.0000");
    }

    #[test]
    fn fee_and_gas_renderings() {
        assert_eq!(format_fee(U256::ZERO), "0");
        assert_eq!(format_fee(U256::from(100_000_000_000_000u64)), "0.0001");
        assert_eq!(format_fee_for_admin(U256::ZERO), "N/A");
        assert_eq!(format_fee_for_admin(U256::from(100_000_000_000_000u64)), "0.000100");
        assert_eq!(format_gas_for_admin(U256::ZERO), "N/A");
        assert_eq!(
            format_gas_for_admin(U256::from(30_000_000_000_000u64)),
            "0.000030000000000"
        );
    }

    #[test]
    fn usd_value_has_two_decimals() {
        assert_eq!(format_usd_value(0.5, 3500.0), "1750.00");
    }
}
