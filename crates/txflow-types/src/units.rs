//! Conversion between native display units and base units.
//!
//! The network's native unit has 18 decimal places. Amounts typed by the user
//! and shown in the page are decimal strings in native units; everything sent
//! to the gateway is an integer number of base units.

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Decimal places of the native unit.
pub const NATIVE_DECIMALS: u8 = 18;

/// Decimal places used when displaying balances.
pub const BALANCE_DISPLAY_DECIMALS: u32 = 4;

/// Errors that can occur while converting amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
	/// The string is not a decimal number.
	#[error("Invalid amount '{0}'")]
	Invalid(String),
	/// The amount is below zero.
	#[error("Amount cannot be negative: {0}")]
	Negative(String),
	/// The amount has more fractional digits than the native unit supports.
	#[error("Amount '{0}' has more than 18 decimal places")]
	TooPrecise(String),
}

/// Parses a decimal amount in native units.
pub fn parse_amount(amount: &str) -> Result<Decimal, UnitsError> {
	let trimmed = amount.trim();
	Decimal::from_str(trimmed).map_err(|_| UnitsError::Invalid(trimmed.to_string()))
}

/// Converts a native-unit decimal string into base units.
pub fn to_base_units(amount: &str) -> Result<U256, UnitsError> {
	let trimmed = amount.trim();
	let decimal = parse_amount(trimmed)?;
	if decimal.is_sign_negative() && !decimal.is_zero() {
		return Err(UnitsError::Negative(trimmed.to_string()));
	}
	if decimal.scale() > NATIVE_DECIMALS as u32 {
		return Err(UnitsError::TooPrecise(trimmed.to_string()));
	}
	parse_ether(trimmed).map_err(|_| UnitsError::Invalid(trimmed.to_string()))
}

/// Converts base units into a native-unit decimal string.
///
/// Trailing fractional zeros are trimmed, so `"0.1"`, `"1"` and `"0.0001"`
/// survive a round trip through [`to_base_units`] unchanged.
pub fn from_base_units(value: U256) -> String {
	let formatted = format_ether(value);
	match formatted.split_once('.') {
		Some((integer, fraction)) => {
			let fraction = fraction.trim_end_matches('0');
			if fraction.is_empty() {
				integer.to_string()
			} else {
				format!("{}.{}", integer, fraction)
			}
		}
		None => formatted,
	}
}

/// Formats a base-unit value as a native-unit balance with four decimals,
/// rounding half away from zero.
pub fn format_base_units_fixed(value: U256) -> String {
	let divisor = U256::from(10u64).pow(U256::from(
		NATIVE_DECIMALS as u32 - BALANCE_DISPLAY_DECIMALS,
	));
	let half = divisor / U256::from(2u64);
	let scaled = (value.saturating_add(half)) / divisor;
	let unit = U256::from(10u64.pow(BALANCE_DISPLAY_DECIMALS));
	let integer = scaled / unit;
	let fraction = scaled % unit;
	format!(
		"{}.{:0>width$}",
		integer,
		fraction.to_string(),
		width = BALANCE_DISPLAY_DECIMALS as usize
	)
}

/// Formats a decimal as a balance with four decimals.
pub fn format_balance(value: Decimal) -> String {
	let rounded =
		value.round_dp_with_strategy(BALANCE_DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
	format!("{:.4}", rounded)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_trip() {
		for amount in ["0.1", "1", "0.0001", "12.5", "0.000000000000000001"] {
			let base = to_base_units(amount).unwrap();
			assert_eq!(from_base_units(base), amount);
		}
	}

	#[test]
	fn test_to_base_units_values() {
		assert_eq!(
			to_base_units("1").unwrap(),
			U256::from(1_000_000_000_000_000_000u128)
		);
		assert_eq!(
			to_base_units("0.5").unwrap(),
			U256::from(500_000_000_000_000_000u128)
		);
	}

	#[test]
	fn test_to_base_units_rejects_bad_input() {
		assert!(matches!(to_base_units("abc"), Err(UnitsError::Invalid(_))));
		assert!(matches!(to_base_units("-1"), Err(UnitsError::Negative(_))));
		assert!(matches!(
			to_base_units("0.0000000000000000001"),
			Err(UnitsError::TooPrecise(_))
		));
	}

	#[test]
	fn test_format_base_units_fixed() {
		assert_eq!(format_base_units_fixed(U256::ZERO), "0.0000");
		assert_eq!(
			format_base_units_fixed(U256::from(500_000_000_000_000_000u128)),
			"0.5000"
		);
		// 78.12345 rounds up in the fourth place
		assert_eq!(
			format_base_units_fixed(U256::from(78_123_450_000_000_000_000u128)),
			"78.1235"
		);
	}

	#[test]
	fn test_format_balance() {
		assert_eq!(format_balance(Decimal::from_str("0.998").unwrap()), "0.9980");
		assert_eq!(format_balance(Decimal::ZERO), "0.0000");
		assert_eq!(format_balance(Decimal::from_str("1.23456").unwrap()), "1.2346");
	}
}
