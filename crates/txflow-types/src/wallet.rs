//! Session wallet.

use crate::SecretKey;
use serde::Serialize;

/// The single wallet owned by a session.
///
/// Only the balance changes after creation: the faucet, explicit refreshes
/// and the optimistic post-transfer estimate all overwrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
	pub address: String,
	pub private_key: SecretKey,
	/// Balance in native units, fixed to four decimal places.
	pub balance: String,
}

impl Wallet {
	pub fn new(address: String, private_key: SecretKey, balance: String) -> Self {
		Self {
			address,
			private_key,
			balance,
		}
	}

	/// Returns true when the locally known balance is zero.
	///
	/// Balances that fail to parse count as zero, so the faucet stays
	/// reachable for a wallet whose balance could not be read.
	pub fn has_zero_balance(&self) -> bool {
		crate::parse_amount(&self.balance)
			.map(|b| b.is_zero())
			.unwrap_or(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wallet(balance: &str) -> Wallet {
		Wallet::new(
			"0xb7fcfe251ca336841d019a731fed59658d150909".to_string(),
			SecretKey::from("0x01"),
			balance.to_string(),
		)
	}

	#[test]
	fn test_zero_balance_detection() {
		assert!(wallet("0.0000").has_zero_balance());
		assert!(wallet("0").has_zero_balance());
		assert!(wallet("garbage").has_zero_balance());
		assert!(!wallet("0.5000").has_zero_balance());
	}

	#[test]
	fn test_private_key_not_serialized() {
		let json = serde_json::to_string(&wallet("1.0000")).unwrap();
		assert!(!json.contains("0x01\""));
		assert!(json.contains("REDACTED"));
	}
}
