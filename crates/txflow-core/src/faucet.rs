//! Faucet dispenser.
//!
//! Sends a fixed amount from a pre-funded account to an empty session wallet,
//! waits for the receipt with the same bounded policy as transfers and reads
//! the new balance. It emits no lifecycle events.

use crate::error::LifecycleError;
use crate::lifecycle::ConfirmationOutcome;
use alloy_primitives::{Address, U256};
use std::time::Duration;
use tracing::instrument;
use txflow_config::{FaucetConfig, LifecycleConfig};
use txflow_gateway::{GatewayService, PollOutcome, PollPolicy};
use txflow_types::{
	format_base_units_fixed, from_base_units, to_base_units, truncate_id, TransferRequest,
	Wallet,
};

/// Wait before re-reading the balance when the receipt was never observed.
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Result of a faucet disbursement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaucetReceipt {
	pub hash: String,
	pub confirmation: ConfirmationOutcome,
	/// Refreshed balance of the funded wallet. `None` when the query failed,
	/// or when it still read zero after an unobserved confirmation.
	pub balance: Option<String>,
}

/// Funds empty wallets from the configured faucet account.
pub struct FaucetDispenser {
	gateway: GatewayService,
	config: FaucetConfig,
	gas_limit: u64,
	policy: PollPolicy,
}

impl FaucetDispenser {
	pub fn new(gateway: GatewayService, config: FaucetConfig, lifecycle: &LifecycleConfig) -> Self {
		Self {
			gateway,
			config,
			gas_limit: lifecycle.gas_limit,
			policy: PollPolicy::new(lifecycle.max_poll_attempts, lifecycle.poll_interval()),
		}
	}

	/// Amount disbursed per request, in native units.
	pub fn amount(&self) -> &str {
		&self.config.amount
	}

	#[instrument(skip_all, fields(target = %target.address))]
	pub async fn dispense(&self, target: &Wallet) -> Result<FaucetReceipt, LifecycleError> {
		if !target.has_zero_balance() {
			return Err(LifecycleError::WalletAlreadyFunded(target.balance.clone()));
		}
		let to: Address = target
			.address
			.parse()
			.map_err(|_| LifecycleError::InvalidRecipient(target.address.clone()))?;
		let amount = to_base_units(&self.config.amount)
			.map_err(|e| LifecycleError::InvalidAmount(e.to_string()))?;

		let faucet_balance = match self.gateway.get_balance(&self.config.address).await {
			Ok(balance) => balance,
			Err(e) => {
				tracing::warn!(error = %e, "Faucet balance query failed, treating as empty");
				U256::ZERO
			}
		};
		if faucet_balance < amount {
			if !self.config.bypass_balance_check {
				return Err(LifecycleError::FaucetDepleted {
					balance: from_base_units(faucet_balance),
					required: self.config.amount.clone(),
				});
			}
			tracing::warn!(
				balance = %from_base_units(faucet_balance),
				required = %self.config.amount,
				"Faucet balance below disbursement, sending anyway (bypass enabled)"
			);
		}

		let account = self
			.gateway
			.account_from_private_key(&self.config.private_key)
			.await?;
		if !account.address.eq_ignore_ascii_case(&self.config.address) {
			return Err(LifecycleError::AccountMismatch {
				claimed: self.config.address.clone(),
				derived: account.address,
			});
		}
		let from: Address = account.address.parse().map_err(|_| {
			LifecycleError::AccountMismatch {
				claimed: self.config.address.clone(),
				derived: account.address.clone(),
			}
		})?;

		let gas_price = self.gateway.get_gas_price().await?;
		let request = TransferRequest {
			from,
			to,
			value: amount,
			gas_limit: self.gas_limit,
			gas_price,
			nonce: None,
		};
		let hash = self
			.gateway
			.send_transaction(request, &self.config.private_key)
			.await?;
		let hash_str = hash.to_string();
		tracing::info!(tx_hash = %truncate_id(&hash_str), amount = %self.config.amount, "Faucet transfer sent");

		let confirmation = match self.gateway.poll_receipt(hash, self.policy).await {
			PollOutcome::Receipt { attempts, .. } => ConfirmationOutcome::Observed { attempts },
			PollOutcome::Exhausted { attempts } => ConfirmationOutcome::Assumed { attempts },
		};

		if confirmation.is_assumed() {
			tokio::time::sleep(SETTLE_DELAY).await;
		}
		let balance = match self.gateway.get_balance(&target.address).await {
			Ok(balance) if balance.is_zero() && confirmation.is_assumed() => {
				tracing::warn!("Funded wallet still reads empty, balance unknown");
				None
			}
			Ok(balance) => Some(format_base_units_fixed(balance)),
			Err(e) => {
				tracing::warn!(error = %e, "Balance refresh after faucet transfer failed");
				None
			}
		};

		Ok(FaucetReceipt {
			hash: hash_str,
			confirmation,
			balance,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use txflow_config::Config;
	use txflow_gateway::implementations::mock::{MockCall, MockGateway, ReceiptScript};
	use txflow_types::SecretKey;

	const TARGET: &str = "0xb7fcfe251ca336841d019a731fed59658d150909";

	fn faucet_config() -> FaucetConfig {
		Config::for_tests().faucet.unwrap()
	}

	fn faucet_address() -> Address {
		faucet_config().address.parse().unwrap()
	}

	fn dispenser(mock: Arc<MockGateway>, config: FaucetConfig) -> FaucetDispenser {
		FaucetDispenser::new(
			GatewayService::new(mock),
			config,
			&Config::for_tests().lifecycle,
		)
	}

	fn empty_wallet() -> Wallet {
		Wallet::new(
			TARGET.to_string(),
			SecretKey::from("0x01"),
			"0.0000".to_string(),
		)
	}

	#[tokio::test]
	async fn test_dispense_funds_empty_wallet() {
		let mock = Arc::new(
			MockGateway::new().with_balance(faucet_address(), U256::from(10u128.pow(19))),
		);
		let dispenser = dispenser(mock.clone(), faucet_config());

		let receipt = dispenser.dispense(&empty_wallet()).await.unwrap();

		assert_eq!(receipt.confirmation, ConfirmationOutcome::Observed { attempts: 1 });
		assert_eq!(receipt.balance.as_deref(), Some("0.5000"));
		let sent = mock.sent().await;
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].value, to_base_units("0.5").unwrap());
		assert_eq!(sent[0].gas_limit, 21_000);
	}

	#[tokio::test]
	async fn test_rejects_funded_wallet() {
		let mock = Arc::new(MockGateway::new());
		let dispenser = dispenser(mock.clone(), faucet_config());
		let mut wallet = empty_wallet();
		wallet.balance = "0.2500".to_string();

		let result = dispenser.dispense(&wallet).await;

		assert!(matches!(result, Err(LifecycleError::WalletAlreadyFunded(_))));
		assert_eq!(mock.total_calls().await, 0);
	}

	#[tokio::test]
	async fn test_depleted_faucet() {
		let mock = Arc::new(
			MockGateway::new().with_balance(faucet_address(), U256::from(10u128.pow(17))),
		);
		let dispenser = dispenser(mock.clone(), faucet_config());

		let result = dispenser.dispense(&empty_wallet()).await;

		match result {
			Err(LifecycleError::FaucetDepleted { balance, required }) => {
				assert_eq!(balance, "0.1");
				assert_eq!(required, "0.5");
			}
			other => panic!("expected FaucetDepleted, got {:?}", other),
		}
		assert_eq!(mock.calls(MockCall::Send).await, 0);
	}

	#[tokio::test]
	async fn test_balance_query_failure_counts_as_depleted() {
		let mock = Arc::new(MockGateway::new());
		mock.fail_on(MockCall::Balance, "rpc down").await;
		let dispenser = dispenser(mock.clone(), faucet_config());

		let result = dispenser.dispense(&empty_wallet()).await;
		assert!(matches!(result, Err(LifecycleError::FaucetDepleted { .. })));
	}

	#[tokio::test]
	async fn test_bypass_sends_anyway() {
		// The node still rejects the underfunded transfer
		let mock = Arc::new(
			MockGateway::new().with_balance(faucet_address(), U256::from(10u128.pow(17))),
		);
		let mut config = faucet_config();
		config.bypass_balance_check = true;
		let dispenser = dispenser(mock.clone(), config);

		let result = dispenser.dispense(&empty_wallet()).await;

		assert_eq!(mock.calls(MockCall::Send).await, 1);
		let err = result.unwrap_err();
		assert_eq!(
			err.user_message(),
			"Insufficient funds for transaction. Please use the faucet to get test tokens."
		);
	}

	#[tokio::test]
	async fn test_faucet_key_mismatch() {
		let mock = Arc::new(
			MockGateway::new().with_balance(
				"0x1234567890123456789012345678901234567890".parse().unwrap(),
				U256::from(10u128.pow(19)),
			),
		);
		let mut config = faucet_config();
		config.address = "0x1234567890123456789012345678901234567890".to_string();
		let dispenser = dispenser(mock.clone(), config);

		let result = dispenser.dispense(&empty_wallet()).await;

		assert!(matches!(result, Err(LifecycleError::AccountMismatch { .. })));
		assert_eq!(mock.calls(MockCall::Send).await, 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_is_not_a_failure() {
		let mock = Arc::new(
			MockGateway::new()
				.with_receipts(ReceiptScript::Never)
				.with_balance(faucet_address(), U256::from(10u128.pow(19))),
		);
		let dispenser = dispenser(mock.clone(), faucet_config());

		let receipt = dispenser.dispense(&empty_wallet()).await.unwrap();

		assert_eq!(receipt.confirmation, ConfirmationOutcome::Assumed { attempts: 30 });
		assert_eq!(mock.calls(MockCall::Receipt).await, 30);
		assert_eq!(receipt.balance.as_deref(), Some("0.5000"));
	}

	#[tokio::test(start_paused = true)]
	async fn test_unobserved_transfer_with_empty_balance_is_unknown() {
		let mock = Arc::new(
			MockGateway::new()
				.with_receipts(ReceiptScript::Never)
				.with_balance(faucet_address(), U256::from(10u128.pow(19))),
		);
		let dispenser = dispenser(mock.clone(), faucet_config());
		let target = empty_wallet();

		let task = {
			let mock = mock.clone();
			let target = target.clone();
			tokio::spawn(async move {
				// the node has not applied the transfer when polling gives up
				while mock.calls(MockCall::Receipt).await < 30 {
					tokio::time::sleep(Duration::from_millis(100)).await;
				}
				mock.set_balance(&target.address, U256::ZERO).await;
			})
		};
		let started = tokio::time::Instant::now();
		let receipt = dispenser.dispense(&target).await.unwrap();
		task.await.unwrap();

		assert!(receipt.confirmation.is_assumed());
		assert_eq!(receipt.balance, None);
		assert!(started.elapsed() >= Duration::from_secs(29) + SETTLE_DELAY);
	}
}
