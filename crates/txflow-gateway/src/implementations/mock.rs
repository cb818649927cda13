//! In-memory gateway for tests and offline demos.
//!
//! `MockGateway` keeps balances, nonces and sent transactions in memory and
//! answers receipt requests according to a [`ReceiptScript`]. Every call is
//! counted so tests can assert how often (or whether) the network was touched,
//! and any call can be made to fail with a chosen message.

use crate::{GatewayError, GatewayInterface};
use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use txflow_account::LocalAccount;
use txflow_types::{
	AccountKeys, BlockInfo, BlockRef, ExecutionStatus, LogRecord, ReceiptInfo, SecretKey,
	TransactionInfo, TransferRequest,
};

const DEFAULT_GAS_PRICE: u128 = 20_000_000_000;
const INITIAL_BLOCK: u64 = 100_000;
const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Gateway operations, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
	Balance,
	GasPrice,
	TransactionCount,
	CreateAccount,
	Send,
	Receipt,
	Transaction,
	Block,
	BlockNumber,
}

/// When receipts become available for sent transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptScript {
	/// The receipt is returned from the n-th request for the hash onwards.
	AfterPolls(u32),
	/// Receipts never arrive.
	Never,
}

#[derive(Debug)]
struct SentTransaction {
	hash: B256,
	request: TransferRequest,
	nonce: u64,
	polls: u32,
	included_in: Option<u64>,
}

#[derive(Debug, Default)]
struct MockState {
	balances: HashMap<Address, U256>,
	nonces: HashMap<Address, u64>,
	sent: Vec<SentTransaction>,
	calls: HashMap<MockCall, usize>,
	failures: HashMap<MockCall, String>,
	head: u64,
	latency: Duration,
}

/// Scripted in-memory gateway.
#[derive(Debug)]
pub struct MockGateway {
	state: Mutex<MockState>,
	receipts: ReceiptScript,
	gas_price: u128,
	status: ExecutionStatus,
	logs: Vec<LogRecord>,
}

impl Default for MockGateway {
	fn default() -> Self {
		Self::new()
	}
}

impl MockGateway {
	/// A gateway whose receipts arrive on the first poll.
	pub fn new() -> Self {
		Self {
			state: Mutex::new(MockState {
				head: INITIAL_BLOCK,
				..Default::default()
			}),
			receipts: ReceiptScript::AfterPolls(1),
			gas_price: DEFAULT_GAS_PRICE,
			status: ExecutionStatus::Success,
			logs: Vec::new(),
		}
	}

	pub fn with_receipts(mut self, script: ReceiptScript) -> Self {
		self.receipts = script;
		self
	}

	pub fn with_gas_price(mut self, gas_price: u128) -> Self {
		self.gas_price = gas_price;
		self
	}

	/// Status reported by every receipt.
	pub fn with_execution_status(mut self, status: ExecutionStatus) -> Self {
		self.status = status;
		self
	}

	/// Logs attached to every receipt.
	pub fn with_logs(mut self, logs: Vec<LogRecord>) -> Self {
		self.logs = logs;
		self
	}

	/// Seeds the balance of an address.
	pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
		self.state.get_mut().balances.insert(address, balance);
		self
	}

	pub async fn set_balance(&self, address: &str, balance: U256) {
		if let Ok(address) = address.parse::<Address>() {
			self.state.lock().await.balances.insert(address, balance);
		}
	}

	/// Makes every subsequent call of the given kind fail with `message`.
	pub async fn fail_on(&self, call: MockCall, message: &str) {
		self.state
			.lock()
			.await
			.failures
			.insert(call, message.to_string());
	}

	pub async fn clear_failure(&self, call: MockCall) {
		self.state.lock().await.failures.remove(&call);
	}

	/// Number of calls of the given kind, failed ones included.
	pub async fn calls(&self, call: MockCall) -> usize {
		self.state
			.lock()
			.await
			.calls
			.get(&call)
			.copied()
			.unwrap_or(0)
	}

	/// Number of calls across all kinds.
	pub async fn total_calls(&self) -> usize {
		self.state.lock().await.calls.values().sum()
	}

	/// Requests accepted by `send_transaction`, in order.
	pub async fn sent(&self) -> Vec<TransferRequest> {
		self.state
			.lock()
			.await
			.sent
			.iter()
			.map(|tx| tx.request.clone())
			.collect()
	}

	pub async fn set_block_number(&self, number: u64) {
		self.state.lock().await.head = number;
	}

	/// Delay applied to every subsequent call before it touches the chain.
	pub async fn set_latency(&self, latency: Duration) {
		self.state.lock().await.latency = latency;
	}

	/// Counts the call and returns the state, or the injected failure.
	async fn enter(&self, call: MockCall) -> Result<MutexGuard<'_, MockState>, GatewayError> {
		let latency = self.state.lock().await.latency;
		if !latency.is_zero() {
			tokio::time::sleep(latency).await;
		}
		let mut state = self.state.lock().await;
		*state.calls.entry(call).or_insert(0) += 1;
		if let Some(message) = state.failures.get(&call) {
			return Err(GatewayError::Network(message.clone()));
		}
		Ok(state)
	}

	fn receipt_for(&self, tx: &SentTransaction, block: u64) -> ReceiptInfo {
		ReceiptInfo {
			transaction_hash: tx.hash.to_string(),
			block_number: block,
			block_hash: block_hash(block).to_string(),
			transaction_index: Some(0),
			status: self.status,
			gas_used: tx.request.gas_limit,
			cumulative_gas_used: tx.request.gas_limit,
			effective_gas_price: tx.request.gas_price,
			contract_address: None,
			logs: self.logs.clone(),
		}
	}
}

fn parse_address(address: &str) -> Result<Address, GatewayError> {
	address
		.parse()
		.map_err(|e| GatewayError::InvalidAddress(format!("{}: {}", address, e)))
}

fn block_hash(number: u64) -> B256 {
	keccak256(number.to_be_bytes())
}

fn block_info(state: &MockState, number: u64) -> BlockInfo {
	let included: Vec<&SentTransaction> = state
		.sent
		.iter()
		.filter(|tx| tx.included_in == Some(number))
		.collect();
	BlockInfo {
		number,
		hash: block_hash(number).to_string(),
		timestamp: GENESIS_TIMESTAMP + number,
		gas_used: included.iter().map(|tx| tx.request.gas_limit).sum(),
		transaction_count: included.len(),
	}
}

#[async_trait]
impl GatewayInterface for MockGateway {
	async fn get_balance(&self, address: &str) -> Result<U256, GatewayError> {
		let state = self.enter(MockCall::Balance).await?;
		let address = parse_address(address)?;
		Ok(state.balances.get(&address).copied().unwrap_or_default())
	}

	async fn get_gas_price(&self) -> Result<u128, GatewayError> {
		self.enter(MockCall::GasPrice).await?;
		Ok(self.gas_price)
	}

	async fn get_transaction_count(&self, address: &str) -> Result<u64, GatewayError> {
		let state = self.enter(MockCall::TransactionCount).await?;
		let address = parse_address(address)?;
		Ok(state.nonces.get(&address).copied().unwrap_or(0))
	}

	async fn create_account(&self) -> Result<AccountKeys, GatewayError> {
		self.enter(MockCall::CreateAccount).await?;
		Ok(LocalAccount::generate().keys())
	}

	async fn send_transaction(
		&self,
		request: TransferRequest,
		key: &SecretKey,
	) -> Result<B256, GatewayError> {
		let mut state = self.enter(MockCall::Send).await?;

		let signer = LocalAccount::from_private_key(key)?;
		if signer.address() != request.from {
			return Err(GatewayError::Network(format!(
				"no signer available for address {}",
				request.from
			)));
		}

		let expected_nonce = state.nonces.get(&request.from).copied().unwrap_or(0);
		let nonce = request.nonce.unwrap_or(expected_nonce);
		if nonce != expected_nonce {
			return Err(GatewayError::Network(format!(
				"invalid nonce: expected {}, got {}",
				expected_nonce, nonce
			)));
		}

		let fee = U256::from(request.gas_limit) * U256::from(request.gas_price);
		let cost = request.value.saturating_add(fee);
		let balance = state.balances.get(&request.from).copied().unwrap_or_default();
		if balance < cost {
			return Err(GatewayError::Network(
				"insufficient funds for gas * price + value".to_string(),
			));
		}

		state.balances.insert(request.from, balance - cost);
		let credited = state
			.balances
			.get(&request.to)
			.copied()
			.unwrap_or_default()
			.saturating_add(request.value);
		state.balances.insert(request.to, credited);
		state.nonces.insert(request.from, nonce + 1);

		let mut preimage = request.from.to_vec();
		preimage.extend_from_slice(&nonce.to_be_bytes());
		let hash = keccak256(preimage);

		state.sent.push(SentTransaction {
			hash,
			request,
			nonce,
			polls: 0,
			included_in: None,
		});
		Ok(hash)
	}

	async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<ReceiptInfo>, GatewayError> {
		let mut state = self.enter(MockCall::Receipt).await?;
		// one block per poll
		state.head += 1;
		let head = state.head;

		let Some(tx) = state.sent.iter_mut().find(|tx| tx.hash == hash) else {
			return Ok(None);
		};
		tx.polls += 1;

		let available = match self.receipts {
			ReceiptScript::AfterPolls(n) => tx.polls >= n,
			ReceiptScript::Never => false,
		};
		if !available {
			return Ok(None);
		}

		let block = *tx.included_in.get_or_insert(head);
		Ok(Some(self.receipt_for(tx, block)))
	}

	async fn get_transaction(&self, hash: B256) -> Result<Option<TransactionInfo>, GatewayError> {
		let state = self.enter(MockCall::Transaction).await?;
		Ok(state.sent.iter().find(|tx| tx.hash == hash).map(|tx| {
			TransactionInfo {
				hash: tx.hash.to_string(),
				from: tx.request.from.to_checksum(None),
				to: Some(tx.request.to.to_checksum(None)),
				value: tx.request.value,
				nonce: tx.nonce,
				gas_limit: tx.request.gas_limit,
				gas_price: Some(tx.request.gas_price),
				block_number: tx.included_in,
				input: "0x".to_string(),
			}
		}))
	}

	async fn get_block(&self, block: BlockRef) -> Result<Option<BlockInfo>, GatewayError> {
		let state = self.enter(MockCall::Block).await?;
		let number = match block {
			BlockRef::Number(number) => (number <= state.head).then_some(number),
			BlockRef::Hash(hash) => state
				.sent
				.iter()
				.filter_map(|tx| tx.included_in)
				.chain(std::iter::once(state.head))
				.find(|number| block_hash(*number) == hash),
		};
		Ok(number.map(|number| block_info(&state, number)))
	}

	async fn get_block_number(&self) -> Result<u64, GatewayError> {
		let state = self.enter(MockCall::BlockNumber).await?;
		Ok(state.head)
	}
}
