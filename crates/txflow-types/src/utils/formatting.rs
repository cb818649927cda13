//! String formatting utilities.
//!
//! Provides functions for hex prefix management and for shortening hashes
//! and addresses in logs and in the page.

/// Truncates a hex string for log output.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Shortens an address to its first 10 and last 8 characters.
///
/// Used in completion messages such as "credited to 0x1234abcd...9876fedc".
pub fn short_address(address: &str) -> String {
	if address.len() <= 18 || !address.is_ascii() {
		address.to_string()
	} else {
		format!("{}...{}", &address[..10], &address[address.len() - 8..])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
