//! Input validation helpers.

fn is_prefixed_hex(value: &str, digits: usize) -> bool {
	match value.strip_prefix("0x") {
		Some(hex) => hex.len() == digits && hex.chars().all(|c| c.is_ascii_hexdigit()),
		None => false,
	}
}

/// Returns true for a `0x` prefixed string of exactly 40 hex characters.
///
/// Checksum casing is not enforced.
pub fn is_valid_address(address: &str) -> bool {
	is_prefixed_hex(address, 40)
}

/// Returns true for a `0x` prefixed string of exactly 64 hex characters.
pub fn is_valid_private_key(key: &str) -> bool {
	is_prefixed_hex(key, 64)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_valid_addresses() {
		assert!(is_valid_address("0xb7fcfe251ca336841d019a731fed59658d150909"));
		assert!(is_valid_address("0xc3E894473BB51b5e5453042420A1d465E69cbCB9"));
	}

	#[test]
	fn test_invalid_addresses() {
		for address in [
			"",
			"0x",
			"b7fcfe251ca336841d019a731fed59658d150909",
			"0xb7fcfe251ca336841d019a731fed59658d15090",
			"0xb7fcfe251ca336841d019a731fed59658d1509090",
			"0xg7fcfe251ca336841d019a731fed59658d150909",
			"0Xb7fcfe251ca336841d019a731fed59658d150909",
		] {
			assert!(!is_valid_address(address), "accepted {:?}", address);
		}
	}

	#[test]
	fn test_private_key_shape() {
		assert!(is_valid_private_key(
			"0x5753e65f56865a161fbf41932a0d855139a4ce9dc20d82fb655bff393fc41702"
		));
		assert!(!is_valid_private_key("0x1234"));
	}
}
