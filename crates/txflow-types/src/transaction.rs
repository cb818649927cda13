//! Accumulated transaction data.
//!
//! [`TransactionData`] collects the fields of a transfer as the lifecycle
//! progresses. Each lifecycle event carries a partial patch that is merged by
//! shallow overwrite: set fields replace current values, unset fields are left
//! alone. Nothing is ever removed except by a full reset.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Outcome of a transaction's execution.
///
/// Serialized as the network's status code: `0` for success and `1` for
/// failure. The gateway maps raw receipt statuses into this enum once, so no
/// other component interprets status integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
	Success,
	Failure,
}

impl ExecutionStatus {
	/// Status code used on the wire.
	pub fn code(&self) -> u8 {
		match self {
			ExecutionStatus::Success => 0,
			ExecutionStatus::Failure => 1,
		}
	}

	/// Maps an EVM receipt status flag (`true` when execution succeeded).
	pub fn from_receipt_flag(succeeded: bool) -> Self {
		if succeeded {
			ExecutionStatus::Success
		} else {
			ExecutionStatus::Failure
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self, ExecutionStatus::Success)
	}
}

impl Serialize for ExecutionStatus {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u8(self.code())
	}
}

impl<'de> Deserialize<'de> for ExecutionStatus {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		match u8::deserialize(deserializer)? {
			0 => Ok(ExecutionStatus::Success),
			1 => Ok(ExecutionStatus::Failure),
			other => Err(serde::de::Error::custom(format!(
				"Invalid execution status code: {}",
				other
			))),
		}
	}
}

/// An event record emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
	/// Address of the emitting contract.
	pub address: String,
	/// Indexed topics, hex encoded.
	pub topics: Vec<String>,
	/// Unindexed payload, hex encoded.
	pub data: String,
	/// Position of the log within the block.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub log_index: Option<u64>,
}

/// Fields accumulated over one lifecycle run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hash: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,
	/// Transferred amount in native units, as a decimal string.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nonce: Option<u64>,
	/// Gas limit requested for the transaction.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas: Option<String>,
	/// Gas price in native units, as a decimal string.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas_price: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub block_number: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub block_hash: Option<String>,
	/// Unix timestamp in seconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<ExecutionStatus>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas_used: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub logs: Option<Vec<LogRecord>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

macro_rules! overwrite_set_fields {
	($target:expr, $patch:expr, $($field:ident),+ $(,)?) => {
		$(
			if $patch.$field.is_some() {
				$target.$field = $patch.$field;
			}
		)+
	};
}

impl TransactionData {
	/// Merges a patch into this record by shallow overwrite.
	pub fn merge(&mut self, patch: TransactionData) {
		overwrite_set_fields!(
			self, patch, hash, from, to, value, nonce, gas, gas_price, data, block_number,
			block_hash, timestamp, status, gas_used, logs, error,
		);
	}

	/// Returns true when no field has been set.
	pub fn is_empty(&self) -> bool {
		*self == TransactionData::default()
	}

	/// Clears every field.
	pub fn clear(&mut self) {
		*self = TransactionData::default();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_overwrites_only_set_fields() {
		let mut data = TransactionData {
			from: Some("0xaaa".to_string()),
			to: Some("0xbbb".to_string()),
			value: Some("0.1".to_string()),
			..Default::default()
		};

		data.merge(TransactionData {
			hash: Some("0x01".to_string()),
			value: Some("0.2".to_string()),
			..Default::default()
		});

		assert_eq!(data.from.as_deref(), Some("0xaaa"));
		assert_eq!(data.to.as_deref(), Some("0xbbb"));
		assert_eq!(data.value.as_deref(), Some("0.2"));
		assert_eq!(data.hash.as_deref(), Some("0x01"));
	}

	#[test]
	fn test_merge_never_removes() {
		let mut data = TransactionData {
			hash: Some("0x01".to_string()),
			nonce: Some(7),
			..Default::default()
		};
		data.merge(TransactionData::default());
		assert_eq!(data.hash.as_deref(), Some("0x01"));
		assert_eq!(data.nonce, Some(7));
	}

	#[test]
	fn test_clear() {
		let mut data = TransactionData {
			error: Some("boom".to_string()),
			..Default::default()
		};
		assert!(!data.is_empty());
		data.clear();
		assert!(data.is_empty());
	}

	#[test]
	fn test_status_wire_convention() {
		assert_eq!(serde_json::to_string(&ExecutionStatus::Success).unwrap(), "0");
		assert_eq!(serde_json::to_string(&ExecutionStatus::Failure).unwrap(), "1");
		assert_eq!(
			ExecutionStatus::from_receipt_flag(true),
			ExecutionStatus::Success
		);
		assert!(serde_json::from_str::<ExecutionStatus>("2").is_err());
	}

	#[test]
	fn test_camel_case_and_omitted_fields() {
		let data = TransactionData {
			gas_price: Some("0.00000002".to_string()),
			block_number: Some(12),
			..Default::default()
		};
		let json = serde_json::to_value(&data).unwrap();
		assert_eq!(
			json,
			serde_json::json!({ "gasPrice": "0.00000002", "blockNumber": 12 })
		);
	}
}
