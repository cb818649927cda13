//! Transaction lifecycle controller.
//!
//! Drives one transfer from intent to confirmation. Progress is reported as
//! an ordered stream of [`LifecycleEvent`]s on a single channel: `created`,
//! `signed`, `broadcasted`, `pending`, `included` and `confirmed`, or `error`
//! as soon as something fails after the run began.
//!
//! Confirmation is observed by polling for the receipt with a bounded budget.
//! When the budget runs out the transfer is still reported as confirmed, with
//! a zero block reference and the requested gas limit as gas used: the node
//! accepted the transaction, only its observation timed out.

use crate::error::LifecycleError;
use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::instrument;
use txflow_config::LifecycleConfig;
use txflow_gateway::{GatewayService, PollOutcome, PollPolicy};
use txflow_types::{
	format_balance, from_base_units, is_valid_address, parse_amount, to_base_units, truncate_id,
	BlockRef, ExecutionStatus, LifecycleEvent, SecretKey, Stage, TransactionData,
	TransferRequest, ZERO_BLOCK_HASH,
};

/// What the user asked for, together with the sender wallet.
#[derive(Debug, Clone)]
pub struct TransferIntent {
	pub sender_address: String,
	pub sender_key: SecretKey,
	/// Locally known sender balance in native units.
	pub sender_balance: String,
	pub recipient: String,
	/// Amount in native units, as typed.
	pub amount: String,
}

/// A transfer that passed the local precondition checks.
#[derive(Debug, Clone)]
pub struct ValidatedTransfer {
	sender_address: String,
	sender_key: SecretKey,
	recipient: Address,
	amount: Decimal,
	value: U256,
}

impl ValidatedTransfer {
	pub fn amount(&self) -> Decimal {
		self.amount
	}
}

/// How the final stage of a run was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
	/// A receipt was observed on the given attempt.
	Observed { attempts: u32 },
	/// No receipt within the budget; success was assumed.
	Assumed { attempts: u32 },
}

impl ConfirmationOutcome {
	pub fn is_assumed(&self) -> bool {
		matches!(self, ConfirmationOutcome::Assumed { .. })
	}
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
	pub hash: String,
	pub status: ExecutionStatus,
	pub confirmation: ConfirmationOutcome,
	/// Transferred amount in native units.
	pub amount: Decimal,
}

/// Drives transfers through the lifecycle stages.
pub struct LifecycleController {
	gateway: GatewayService,
	config: LifecycleConfig,
}

impl LifecycleController {
	pub fn new(gateway: GatewayService, config: LifecycleConfig) -> Self {
		Self { gateway, config }
	}

	pub fn config(&self) -> &LifecycleConfig {
		&self.config
	}

	/// Checks the recipient, the amount and the known balance.
	///
	/// Makes no network calls and emits no events.
	pub fn validate(&self, intent: &TransferIntent) -> Result<ValidatedTransfer, LifecycleError> {
		if !is_valid_address(&intent.recipient) {
			return Err(LifecycleError::InvalidRecipient(intent.recipient.clone()));
		}
		let recipient: Address = intent
			.recipient
			.parse()
			.map_err(|_| LifecycleError::InvalidRecipient(intent.recipient.clone()))?;

		let amount = parse_amount(&intent.amount)
			.map_err(|e| LifecycleError::InvalidAmount(e.to_string()))?;
		if amount <= Decimal::ZERO {
			return Err(LifecycleError::InvalidAmount(format!(
				"amount must be greater than zero, got {}",
				intent.amount.trim()
			)));
		}
		let value = to_base_units(&intent.amount)
			.map_err(|e| LifecycleError::InvalidAmount(e.to_string()))?;

		// Advisory only; the node has the final say at broadcast
		let available = parse_amount(&intent.sender_balance).unwrap_or(Decimal::ZERO);
		let required = amount + self.config.estimated_fee;
		if required > available {
			return Err(LifecycleError::InsufficientBalance {
				required: format_balance(required),
				available: format_balance(available),
			});
		}

		Ok(ValidatedTransfer {
			sender_address: intent.sender_address.clone(),
			sender_key: intent.sender_key.clone(),
			recipient,
			amount,
			value,
		})
	}

	/// Validates `intent` and drives it to completion.
	pub async fn send(
		&self,
		intent: TransferIntent,
		events: &mpsc::UnboundedSender<LifecycleEvent>,
	) -> Result<TransferOutcome, LifecycleError> {
		let transfer = self.validate(&intent)?;
		self.execute(transfer, events).await
	}

	/// Drives an already validated transfer. Any failure is reported as an
	/// `error` event carrying the user-facing message before being returned.
	#[instrument(skip_all, fields(to = %transfer.recipient, amount = %transfer.amount))]
	pub async fn execute(
		&self,
		transfer: ValidatedTransfer,
		events: &mpsc::UnboundedSender<LifecycleEvent>,
	) -> Result<TransferOutcome, LifecycleError> {
		match self.drive(&transfer, events).await {
			Ok(outcome) => Ok(outcome),
			Err(e) => {
				tracing::error!(error = %e, "Transfer failed");
				emit(events, LifecycleEvent::error(e.user_message()));
				Err(e)
			}
		}
	}

	async fn drive(
		&self,
		transfer: &ValidatedTransfer,
		events: &mpsc::UnboundedSender<LifecycleEvent>,
	) -> Result<TransferOutcome, LifecycleError> {
		let account = self
			.gateway
			.account_from_private_key(&transfer.sender_key)
			.await?;
		if !account
			.address
			.eq_ignore_ascii_case(transfer.sender_address.trim())
		{
			return Err(LifecycleError::AccountMismatch {
				claimed: transfer.sender_address.clone(),
				derived: account.address,
			});
		}
		let from: Address = account.address.parse().map_err(|_| {
			LifecycleError::AccountMismatch {
				claimed: transfer.sender_address.clone(),
				derived: account.address.clone(),
			}
		})?;

		let gas_price = self.gateway.get_gas_price().await?;
		emit(
			events,
			LifecycleEvent::new(
				Stage::Created,
				TransactionData {
					from: Some(account.address.clone()),
					to: Some(transfer.recipient.to_checksum(None)),
					value: Some(from_base_units(transfer.value)),
					..Default::default()
				},
			),
		);
		self.pause().await;

		let nonce = self
			.gateway
			.get_transaction_count(&account.address)
			.await?;
		emit(
			events,
			LifecycleEvent::new(
				Stage::Signed,
				TransactionData {
					nonce: Some(nonce),
					gas: Some(self.config.gas_limit.to_string()),
					gas_price: Some(from_base_units(U256::from(gas_price))),
					..Default::default()
				},
			),
		);
		self.pause().await;

		let request = TransferRequest {
			from,
			to: transfer.recipient,
			value: transfer.value,
			gas_limit: self.config.gas_limit,
			gas_price,
			nonce: Some(nonce),
		};
		let hash = self
			.gateway
			.send_transaction(request, &transfer.sender_key)
			.await?;
		let hash_str = hash.to_string();
		tracing::info!(tx_hash = %truncate_id(&hash_str), nonce, "Transaction broadcast");

		let hash_only = TransactionData {
			hash: Some(hash_str.clone()),
			..Default::default()
		};
		emit(events, LifecycleEvent::new(Stage::Broadcasted, hash_only.clone()));
		emit(events, LifecycleEvent::new(Stage::Pending, hash_only));

		let policy = PollPolicy::new(self.config.max_poll_attempts, self.config.poll_interval());
		let (status, confirmation) = match self.gateway.poll_receipt(hash, policy).await {
			PollOutcome::Receipt { receipt, attempts } => {
				let timestamp = match self
					.gateway
					.get_block(BlockRef::Number(receipt.block_number))
					.await
				{
					Ok(Some(block)) => block.timestamp,
					_ => unix_now(),
				};
				emit(
					events,
					LifecycleEvent::new(
						Stage::Included,
						TransactionData {
							block_number: Some(receipt.block_number),
							block_hash: Some(receipt.block_hash.clone()),
							timestamp: Some(timestamp),
							..Default::default()
						},
					),
				);
				emit(
					events,
					LifecycleEvent::new(
						Stage::Confirmed,
						TransactionData {
							status: Some(receipt.status),
							gas_used: Some(receipt.gas_used.to_string()),
							logs: Some(receipt.logs),
							..Default::default()
						},
					),
				);
				(receipt.status, ConfirmationOutcome::Observed { attempts })
			}
			PollOutcome::Exhausted { attempts } => {
				tracing::warn!(
					tx_hash = %truncate_id(&hash_str),
					attempts,
					"Confirmation not observed, assuming success"
				);
				emit(
					events,
					LifecycleEvent::new(
						Stage::Included,
						TransactionData {
							block_number: Some(0),
							block_hash: Some(ZERO_BLOCK_HASH.to_string()),
							timestamp: Some(unix_now()),
							..Default::default()
						},
					),
				);
				emit(
					events,
					LifecycleEvent::new(
						Stage::Confirmed,
						TransactionData {
							status: Some(ExecutionStatus::Success),
							gas_used: Some(self.config.gas_limit.to_string()),
							logs: Some(Vec::new()),
							..Default::default()
						},
					),
				);
				(
					ExecutionStatus::Success,
					ConfirmationOutcome::Assumed { attempts },
				)
			}
		};

		tracing::info!(
			tx_hash = %truncate_id(&hash_str),
			status = ?status,
			assumed = confirmation.is_assumed(),
			"Transfer confirmed"
		);

		Ok(TransferOutcome {
			hash: hash_str,
			status,
			confirmation,
			amount: transfer.amount,
		})
	}

	async fn pause(&self) {
		let delay: Duration = self.config.stage_delay();
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
	}
}

fn emit(events: &mpsc::UnboundedSender<LifecycleEvent>, event: LifecycleEvent) {
	tracing::debug!(stage = %event.stage, "Lifecycle event");
	if events.send(event).is_err() {
		tracing::debug!("Lifecycle event receiver dropped");
	}
}

fn unix_now() -> u64 {
	u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
