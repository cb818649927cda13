//! Live data overlay.
//!
//! Reads the current state of a transaction straight from the network so the
//! panel can show it next to the lifecycle snapshot. Failures are captured in
//! [`LiveData::error`] and never reach the lifecycle.

use alloy_primitives::{B256, U256};
use serde::Serialize;
use tracing::instrument;
use txflow_gateway::{GatewayError, GatewayService};
use txflow_types::{
	from_base_units, truncate_id, BlockInfo, BlockRef, ReceiptInfo, TransactionInfo,
};

/// Network view of one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveData {
	pub transaction: Option<TransactionInfo>,
	pub receipt: Option<ReceiptInfo>,
	/// Block that includes the transaction, once a receipt exists.
	pub block: Option<BlockInfo>,
	/// Current network gas price in native units.
	pub gas_price: Option<String>,
	/// Current head of the chain.
	pub block_number: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl LiveData {
	/// Blocks mined since the including block.
	pub fn confirmations(&self) -> Option<u64> {
		let receipt = self.receipt.as_ref()?;
		let current = self.block_number?;
		Some(current.saturating_sub(receipt.block_number))
	}
}

/// Fetches [`LiveData`] through the gateway.
#[derive(Clone)]
pub struct LiveDataFetcher {
	gateway: GatewayService,
}

impl LiveDataFetcher {
	pub fn new(gateway: GatewayService) -> Self {
		Self { gateway }
	}

	/// Fetches a fresh view of `hash`.
	pub async fn fetch(&self, hash: &str) -> LiveData {
		self.refresh(hash, &LiveData::default()).await
	}

	/// Fetches a fresh view of `hash`. On failure the previous view is kept
	/// and only its error is replaced.
	#[instrument(skip_all, fields(tx_hash = %truncate_id(hash)))]
	pub async fn refresh(&self, hash: &str, previous: &LiveData) -> LiveData {
		match self.read(hash).await {
			Ok(data) => data,
			Err(e) => {
				tracing::warn!(error = %e, "Live data fetch failed");
				LiveData {
					error: Some(format!("Failed to fetch real-time data: {}", e)),
					..previous.clone()
				}
			}
		}
	}

	async fn read(&self, hash: &str) -> Result<LiveData, GatewayError> {
		let tx_hash: B256 = hash
			.trim()
			.parse()
			.map_err(|_| GatewayError::Network(format!("invalid transaction hash {}", hash)))?;

		let transaction = self.gateway.get_transaction(tx_hash).await?;
		let receipt = self.gateway.get_transaction_receipt(tx_hash).await?;
		let gas_price = self.gateway.get_gas_price().await?;
		let block_number = self.gateway.get_block_number().await?;
		let block = match &receipt {
			Some(r) => {
				self.gateway
					.get_block(BlockRef::Number(r.block_number))
					.await?
			}
			None => None,
		};

		Ok(LiveData {
			transaction,
			receipt,
			block,
			gas_price: Some(from_base_units(U256::from(gas_price))),
			block_number: Some(block_number),
			error: None,
		})
	}
}
