//! Alloy-based gateway implementation.
//!
//! Talks to an EVM JSON-RPC endpoint over HTTP. Reads go through a shared
//! provider; transfers build a short-lived provider around the sender's
//! signer so each transaction is signed locally with the key it was given.

use crate::{GatewayError, GatewayInterface};
use alloy_consensus::Transaction as _;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::{BlockNumberOrTag, BlockTransactionsKind, TransactionRequest};
use alloy_signer::Signer;
use alloy_transport_http::Http;
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use txflow_account::LocalAccount;
use txflow_config::NetworkConfig;
use txflow_types::{
	truncate_id, with_0x_prefix, BlockInfo, BlockRef, ExecutionStatus, LogRecord, ReceiptInfo,
	SecretKey, TransactionInfo, TransferRequest,
};

/// Gateway backed by an alloy HTTP provider.
pub struct AlloyGateway {
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	rpc_url: Url,
	chain_id: Option<u64>,
}

impl AlloyGateway {
	/// Creates a gateway for the configured network.
	///
	/// The chain ID is taken from the configuration when present and fetched
	/// from the endpoint at signing time otherwise.
	pub fn new(network: &NetworkConfig) -> Result<Self, GatewayError> {
		let rpc_url: Url = network.rpc_url.parse().map_err(|e| {
			GatewayError::Network(format!("Invalid RPC URL {}: {}", network.rpc_url, e))
		})?;

		let provider = ProviderBuilder::new().on_http(rpc_url.clone());

		tracing::info!(
			network = %network.name,
			rpc_url = %rpc_url,
			chain_id = ?network.chain_id,
			"Configured JSON-RPC gateway"
		);

		Ok(Self {
			provider: Arc::new(provider),
			rpc_url,
			chain_id: network.chain_id,
		})
	}
}

fn parse_address(address: &str) -> Result<Address, GatewayError> {
	address
		.parse()
		.map_err(|e| GatewayError::InvalidAddress(format!("{}: {}", address, e)))
}

/// Legacy-priced transfer; the nonce is left to the provider's filler when absent.
fn transaction_request(request: &TransferRequest) -> TransactionRequest {
	let tx = TransactionRequest::default()
		.with_from(request.from)
		.with_to(request.to)
		.with_value(request.value)
		.with_gas_limit(request.gas_limit)
		.with_gas_price(request.gas_price);
	match request.nonce {
		Some(nonce) => tx.with_nonce(nonce),
		None => tx,
	}
}

fn to_log_record(log: &alloy_rpc_types::Log) -> LogRecord {
	LogRecord {
		address: log.address().to_checksum(None),
		topics: log.topics().iter().map(|t| t.to_string()).collect(),
		data: with_0x_prefix(&alloy_primitives::hex::encode(&log.data().data)),
		log_index: log.log_index,
	}
}

#[async_trait]
impl GatewayInterface for AlloyGateway {
	async fn get_balance(&self, address: &str) -> Result<U256, GatewayError> {
		let address = parse_address(address)?;
		self.provider
			.get_balance(address)
			.await
			.map_err(|e| GatewayError::Network(format!("Failed to get balance: {}", e)))
	}

	async fn get_gas_price(&self) -> Result<u128, GatewayError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| GatewayError::Network(format!("Failed to get gas price: {}", e)))
	}

	async fn get_transaction_count(&self, address: &str) -> Result<u64, GatewayError> {
		let address = parse_address(address)?;
		self.provider
			.get_transaction_count(address)
			.await
			.map_err(|e| GatewayError::Network(format!("Failed to get nonce: {}", e)))
	}

	async fn send_transaction(
		&self,
		request: TransferRequest,
		key: &SecretKey,
	) -> Result<B256, GatewayError> {
		let account = LocalAccount::from_private_key(key)?;
		let signer = account.signer().clone().with_chain_id(self.chain_id);
		let wallet = EthereumWallet::from(signer);

		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(wallet)
			.on_http(self.rpc_url.clone());

		let tx = transaction_request(&request);

		// Send transaction - the provider's wallet will handle signing
		let pending_tx = provider
			.send_transaction(tx)
			.await
			.map_err(|e| GatewayError::Network(format!("Failed to send transaction: {}", e)))?;

		let tx_hash = *pending_tx.tx_hash();
		tracing::info!(
			tx_hash = %truncate_id(&tx_hash.to_string()),
			from = %request.from,
			to = %request.to,
			"Submitted transaction"
		);
		Ok(tx_hash)
	}

	async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<ReceiptInfo>, GatewayError> {
		let receipt = self
			.provider
			.get_transaction_receipt(hash)
			.await
			.map_err(|e| GatewayError::Network(format!("Failed to get receipt: {}", e)))?;

		// A receipt without a block is still pending
		let Some(receipt) = receipt else {
			return Ok(None);
		};
		let (Some(block_number), Some(block_hash)) = (receipt.block_number, receipt.block_hash)
		else {
			return Ok(None);
		};

		Ok(Some(ReceiptInfo {
			transaction_hash: receipt.transaction_hash.to_string(),
			block_number,
			block_hash: block_hash.to_string(),
			transaction_index: receipt.transaction_index,
			status: ExecutionStatus::from_receipt_flag(receipt.status()),
			gas_used: u64::try_from(receipt.gas_used).unwrap_or(u64::MAX),
			cumulative_gas_used: u64::try_from(receipt.inner.cumulative_gas_used())
				.unwrap_or(u64::MAX),
			effective_gas_price: receipt.effective_gas_price,
			contract_address: receipt.contract_address.map(|a| a.to_checksum(None)),
			logs: receipt.inner.logs().iter().map(to_log_record).collect(),
		}))
	}

	async fn get_transaction(&self, hash: B256) -> Result<Option<TransactionInfo>, GatewayError> {
		let tx = self
			.provider
			.get_transaction_by_hash(hash)
			.await
			.map_err(|e| GatewayError::Network(format!("Failed to get transaction: {}", e)))?;

		Ok(tx.map(|tx| TransactionInfo {
			hash: hash.to_string(),
			from: tx.from.to_checksum(None),
			to: tx.to().map(|a| a.to_checksum(None)),
			value: tx.value(),
			nonce: tx.nonce(),
			gas_limit: tx.gas_limit(),
			gas_price: tx.gas_price(),
			block_number: tx.block_number,
			input: with_0x_prefix(&alloy_primitives::hex::encode(tx.input())),
		}))
	}

	async fn get_block(&self, block: BlockRef) -> Result<Option<BlockInfo>, GatewayError> {
		let result = match block {
			BlockRef::Number(number) => {
				self.provider
					.get_block_by_number(
						BlockNumberOrTag::Number(number),
						BlockTransactionsKind::Hashes,
					)
					.await
			}
			BlockRef::Hash(hash) => {
				self.provider
					.get_block_by_hash(hash, BlockTransactionsKind::Hashes)
					.await
			}
		}
		.map_err(|e| GatewayError::Network(format!("Failed to get block: {}", e)))?;

		Ok(result.map(|block| BlockInfo {
			number: block.header.number,
			hash: block.header.hash.to_string(),
			timestamp: block.header.timestamp,
			gas_used: u64::try_from(block.header.gas_used).unwrap_or(u64::MAX),
			transaction_count: block.transactions.len(),
		}))
	}

	async fn get_block_number(&self) -> Result<u64, GatewayError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| GatewayError::Network(format!("Failed to get block number: {}", e)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::TxKind;

	fn network(rpc_url: &str) -> NetworkConfig {
		NetworkConfig {
			name: "Local".to_string(),
			rpc_url: rpc_url.to_string(),
			chain_id: Some(71),
			symbol: "CFX".to_string(),
			explorer_url: None,
		}
	}

	fn transfer(nonce: Option<u64>) -> TransferRequest {
		TransferRequest {
			from: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
			to: "0xb7fcfe251ca336841d019a731fed59658d150909".parse().unwrap(),
			value: U256::from(100_000_000_000_000_000u128),
			gas_limit: 21_000,
			gas_price: 20_000_000_000,
			nonce,
		}
	}

	#[test]
	fn test_transaction_request_fields() {
		let request = transfer(Some(7));
		let tx = transaction_request(&request);

		assert_eq!(tx.from, Some(request.from));
		assert_eq!(tx.to, Some(TxKind::Call(request.to)));
		assert_eq!(tx.value, Some(request.value));
		assert_eq!(tx.gas, Some(21_000));
		assert_eq!(tx.gas_price, Some(20_000_000_000));
		assert_eq!(tx.nonce, Some(7));
	}

	#[test]
	fn test_transaction_request_without_nonce() {
		let tx = transaction_request(&transfer(None));
		assert_eq!(tx.nonce, None);
		assert_eq!(tx.gas_price, Some(20_000_000_000));
	}

	#[test]
	fn test_rejects_invalid_rpc_url() {
		let result = AlloyGateway::new(&network("not a url"));
		assert!(matches!(result, Err(GatewayError::Network(_))));
	}

	#[tokio::test]
	async fn test_rejects_invalid_address_before_request() {
		let gateway = AlloyGateway::new(&network("http://127.0.0.1:1")).unwrap();
		let err = gateway.get_balance("0x1234").await.unwrap_err();
		assert!(matches!(err, GatewayError::InvalidAddress(_)));
	}
}
