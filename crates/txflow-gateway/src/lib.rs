//! Chain gateway module for the txflow lifecycle visualizer.
//!
//! This module is the only place that talks to the network. It defines the
//! [`GatewayInterface`] consumed by the wallet provisioner, the faucet, the
//! lifecycle controller and the live-data overlay, together with a service
//! wrapper that adds the bounded receipt polling loop they share.

use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use txflow_account::{AccountError, LocalAccount};
use txflow_types::{
	truncate_id, AccountKeys, BlockInfo, BlockRef, ReceiptInfo, SecretKey, TransactionInfo,
	TransferRequest,
};

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod mock;
}

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
	/// Error that occurs during network communication or returned by the node.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when an address string cannot be parsed.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// Error raised while deriving or generating key material.
	#[error(transparent)]
	Account(#[from] AccountError),
}

/// Trait defining the interface to an EVM JSON-RPC endpoint.
///
/// All amounts are in base units. Addresses are accepted as strings and
/// parsed by the implementation.
#[async_trait]
pub trait GatewayInterface: Send + Sync {
	/// Balance of an address.
	async fn get_balance(&self, address: &str) -> Result<U256, GatewayError>;

	/// Current gas price.
	async fn get_gas_price(&self) -> Result<u128, GatewayError>;

	/// Number of transactions sent from an address, i.e. its next nonce.
	async fn get_transaction_count(&self, address: &str) -> Result<u64, GatewayError>;

	/// Generates a fresh address/key pair.
	async fn create_account(&self) -> Result<AccountKeys, GatewayError> {
		Ok(LocalAccount::generate().keys())
	}

	/// Derives the address belonging to a private key.
	async fn account_from_private_key(
		&self,
		key: &SecretKey,
	) -> Result<AccountKeys, GatewayError> {
		Ok(LocalAccount::from_private_key(key)?.keys())
	}

	/// Signs `request` with `key` and broadcasts it, returning the
	/// transaction hash once the node accepts it.
	async fn send_transaction(
		&self,
		request: TransferRequest,
		key: &SecretKey,
	) -> Result<B256, GatewayError>;

	/// Receipt of a transaction, or `None` while it is not yet included.
	async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<ReceiptInfo>, GatewayError>;

	async fn get_transaction(&self, hash: B256) -> Result<Option<TransactionInfo>, GatewayError>;

	async fn get_block(&self, block: BlockRef) -> Result<Option<BlockInfo>, GatewayError>;

	async fn get_block_number(&self) -> Result<u64, GatewayError>;
}

/// Bounded retry policy for receipt polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
	/// Maximum number of receipt requests.
	pub attempts: u32,
	/// Pause between two requests.
	pub interval: Duration,
}

impl PollPolicy {
	pub fn new(attempts: u32, interval: Duration) -> Self {
		Self { attempts, interval }
	}
}

/// Result of a bounded receipt poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
	/// A receipt was observed on the given attempt (1-based).
	Receipt { receipt: ReceiptInfo, attempts: u32 },
	/// Every attempt came back without a receipt.
	Exhausted { attempts: u32 },
}

/// Service that wraps a gateway implementation.
///
/// Besides delegating, it owns the polling loop used by every component that
/// waits for a receipt.
#[derive(Clone)]
pub struct GatewayService {
	implementation: Arc<dyn GatewayInterface>,
}

impl GatewayService {
	pub fn new(implementation: Arc<dyn GatewayInterface>) -> Self {
		Self { implementation }
	}

	/// Polls for the receipt of `hash` until one is observed or the policy's
	/// attempt budget is spent.
	///
	/// A missing receipt and a failed request both count as "not yet"; the
	/// loop never returns an error. There is no pause after the last attempt.
	#[instrument(skip_all, fields(tx_hash = %truncate_id(&hash.to_string())))]
	pub async fn poll_receipt(&self, hash: B256, policy: PollPolicy) -> PollOutcome {
		let mut attempt = 0;
		while attempt < policy.attempts {
			attempt += 1;
			match self.implementation.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => {
					tracing::info!(
						attempt,
						block_number = receipt.block_number,
						"Receipt observed"
					);
					return PollOutcome::Receipt {
						receipt,
						attempts: attempt,
					};
				}
				Ok(None) => {
					tracing::debug!(attempt, "Receipt not available yet");
				}
				Err(e) => {
					tracing::debug!(attempt, error = %e, "Receipt request failed, retrying");
				}
			}

			if attempt < policy.attempts {
				tokio::time::sleep(policy.interval).await;
			}
		}

		tracing::warn!(
			attempts = policy.attempts,
			"No receipt within the polling budget"
		);
		PollOutcome::Exhausted {
			attempts: policy.attempts,
		}
	}
}

impl std::ops::Deref for GatewayService {
	type Target = dyn GatewayInterface;

	fn deref(&self) -> &Self::Target {
		self.implementation.as_ref()
	}
}
