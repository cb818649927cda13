//! Records exchanged with the chain gateway.
//!
//! These types describe what the gateway returns for accounts, receipts,
//! transactions and blocks, independently of the RPC client used to fetch
//! them. Hashes and addresses are kept as `0x` prefixed hex strings so the
//! presentation layer can show them as-is.

use crate::{ExecutionStatus, LogRecord, SecretKey};
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// A freshly generated or derived address/key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKeys {
	/// Checksummed address.
	pub address: String,
	pub private_key: SecretKey,
}

/// A native-value transfer ready to be signed and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
	pub from: Address,
	pub to: Address,
	/// Transferred value in base units.
	pub value: U256,
	pub gas_limit: u64,
	/// Gas price in base units.
	pub gas_price: u128,
	/// Explicit nonce; the gateway resolves it when absent.
	pub nonce: Option<u64>,
}

/// Execution receipt of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptInfo {
	pub transaction_hash: String,
	pub block_number: u64,
	pub block_hash: String,
	pub transaction_index: Option<u64>,
	pub status: ExecutionStatus,
	pub gas_used: u64,
	pub cumulative_gas_used: u64,
	/// Effective gas price in base units.
	pub effective_gas_price: u128,
	pub contract_address: Option<String>,
	pub logs: Vec<LogRecord>,
}

/// A transaction as currently known to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
	pub hash: String,
	pub from: String,
	pub to: Option<String>,
	/// Value in base units.
	#[serde(with = "crate::utils::u256_serde")]
	pub value: U256,
	pub nonce: u64,
	pub gas_limit: u64,
	/// Legacy gas price in base units, when the transaction carries one.
	pub gas_price: Option<u128>,
	pub block_number: Option<u64>,
	pub input: String,
}

/// Block header summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
	pub number: u64,
	pub hash: String,
	/// Unix timestamp in seconds.
	pub timestamp: u64,
	pub gas_used: u64,
	pub transaction_count: usize,
}

/// Identifies a block either by height or by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
	Number(u64),
	Hash(B256),
}

impl From<u64> for BlockRef {
	fn from(number: u64) -> Self {
		BlockRef::Number(number)
	}
}

impl From<B256> for BlockRef {
	fn from(hash: B256) -> Self {
		BlockRef::Hash(hash)
	}
}
