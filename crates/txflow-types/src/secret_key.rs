//! Private key wrapper.
//!
//! `SecretKey` holds a hex encoded private key. The memory is zeroed on drop
//! and the value never shows up in `Debug`, `Display` or serialized logs. The
//! only way to read it is [`SecretKey::reveal`] or [`SecretKey::with_exposed`],
//! which the wallet view uses on purpose: this application shows generated
//! keys to the user.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// A private key that zeros its memory on drop and redacts itself in output.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
	pub fn new(key: String) -> Self {
		Self(Zeroizing::new(key))
	}

	/// Returns the key in plaintext.
	pub fn reveal(&self) -> &str {
		&self.0
	}

	/// Exposes the key to a closure, limiting where it is visible.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// Short, log-safe preview of the key (`0x5753e6...`).
	pub fn preview(&self) -> String {
		let visible: String = self.0.chars().take(8).collect();
		format!("{}...", visible)
	}
}

impl fmt::Debug for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretKey(***REDACTED***)")
	}
}

impl fmt::Display for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "***REDACTED***")
	}
}

impl From<String> for SecretKey {
	fn from(key: String) -> Self {
		Self::new(key)
	}
}

impl From<&str> for SecretKey {
	fn from(key: &str) -> Self {
		Self::new(key.to_string())
	}
}

impl PartialEq for SecretKey {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretKey {}

// Serialization redacts; the wallet view reveals the key explicitly.
impl Serialize for SecretKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str("***REDACTED***")
	}
}

impl<'de> Deserialize<'de> for SecretKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretKey::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0x5753e65f56865a161fbf41932a0d855139a4ce9dc20d82fb655bff393fc41702";

	#[test]
	fn test_redacted_output() {
		let key = SecretKey::from(KEY);
		assert_eq!(format!("{:?}", key), "SecretKey(***REDACTED***)");
		assert_eq!(format!("{}", key), "***REDACTED***");
		assert_eq!(serde_json::to_string(&key).unwrap(), "\"***REDACTED***\"");
	}

	#[test]
	fn test_reveal_and_preview() {
		let key = SecretKey::from(KEY);
		assert_eq!(key.reveal(), KEY);
		assert_eq!(key.preview(), "0x5753e6...");
		assert_eq!(key.with_exposed(|k| k.len()), 66);
	}

	#[test]
	fn test_deserialize_keeps_value() {
		let key: SecretKey = serde_json::from_str(&format!("\"{}\"", KEY)).unwrap();
		assert_eq!(key, SecretKey::from(KEY));
	}
}
