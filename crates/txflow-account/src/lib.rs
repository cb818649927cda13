//! Account management module for the txflow lifecycle visualizer.
//!
//! This module wraps local key material: generating fresh keypairs and
//! deriving the account that belongs to a private key. Signing itself happens
//! in the gateway, which receives the signer from here.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use std::fmt;
use thiserror::Error;
use txflow_types::{is_valid_private_key, AccountKeys, SecretKey};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid private key: {0}")]
	InvalidKey(String),
}

/// An account backed by a private key held in memory.
#[derive(Clone)]
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Generates a new account from fresh entropy.
	pub fn generate() -> Self {
		Self {
			signer: PrivateKeySigner::random(),
		}
	}

	/// Derives the account belonging to a `0x` prefixed hex private key.
	pub fn from_private_key(key: &SecretKey) -> Result<Self, AccountError> {
		key.with_exposed(|raw| {
			if !is_valid_private_key(raw) {
				return Err(AccountError::InvalidKey(
					"expected 0x followed by 64 hex characters".into(),
				));
			}
			raw.parse::<PrivateKeySigner>()
				.map(|signer| Self { signer })
				.map_err(|e| AccountError::InvalidKey(e.to_string()))
		})
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	/// Returns true when `claimed` names this account, ignoring case.
	pub fn matches_address(&self, claimed: &str) -> bool {
		self.address().to_string().eq_ignore_ascii_case(claimed.trim())
	}

	/// Address and private key as shown to the user.
	pub fn keys(&self) -> AccountKeys {
		let key_bytes = self.signer.credential().to_bytes();
		AccountKeys {
			address: self.address().to_checksum(None),
			private_key: SecretKey::new(format!("0x{}", hex::encode(key_bytes))),
		}
	}

	/// The signer used to sign transactions for this account.
	pub fn signer(&self) -> &PrivateKeySigner {
		&self.signer
	}
}

impl fmt::Debug for LocalAccount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LocalAccount")
			.field("address", &self.address())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	#[test]
	fn test_from_private_key() {
		let account = LocalAccount::from_private_key(&SecretKey::from(KEY)).unwrap();
		assert_eq!(account.address().to_checksum(None), ADDRESS);
		assert!(account.matches_address(&ADDRESS.to_lowercase()));
		assert!(!account.matches_address("0x1234567890123456789012345678901234567890"));
	}

	#[test]
	fn test_keys_round_trip() {
		let account = LocalAccount::generate();
		let keys = account.keys();
		assert!(txflow_types::is_valid_address(&keys.address));
		assert!(keys.private_key.with_exposed(is_valid_private_key));

		let derived = LocalAccount::from_private_key(&keys.private_key).unwrap();
		assert_eq!(derived.address(), account.address());
	}

	#[test]
	fn test_rejects_malformed_key() {
		let result = LocalAccount::from_private_key(&SecretKey::from("0x1234"));
		assert!(matches!(result, Err(AccountError::InvalidKey(_))));
	}

	#[test]
	fn test_debug_hides_key() {
		let account = LocalAccount::from_private_key(&SecretKey::from(KEY)).unwrap();
		let debug = format!("{:?}", account);
		assert!(!debug.contains("ac0974"));
	}
}
