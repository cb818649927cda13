//! Serde module for U256 values carried as decimal strings.

use alloy_primitives::U256;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	value.to_string().serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	let s = String::deserialize(deserializer)?;
	U256::from_str_radix(&s, 10).map_err(D::Error::custom)
}
