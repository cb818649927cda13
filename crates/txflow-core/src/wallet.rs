//! Wallet provisioning and balance bookkeeping.

use crate::error::LifecycleError;
use rust_decimal::Decimal;
use tracing::instrument;
use txflow_gateway::GatewayService;
use txflow_types::{format_balance, format_base_units_fixed, parse_amount, SecretKey, Wallet};

/// Address used when account generation fails. It holds no funds.
pub const PLACEHOLDER_ADDRESS: &str = "0x1234567890123456789012345678901234567890";

/// Key paired with [`PLACEHOLDER_ADDRESS`]. It does not derive that address.
pub const PLACEHOLDER_PRIVATE_KEY: &str =
	"0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

/// Balance reported when the balance query fails.
pub const UNKNOWN_BALANCE: &str = "0.0000";

/// Creates session wallets and reads their balances.
pub struct WalletProvisioner {
	gateway: GatewayService,
}

impl WalletProvisioner {
	pub fn new(gateway: GatewayService) -> Self {
		Self { gateway }
	}

	/// Generates a wallet and resolves its starting balance.
	///
	/// Never fails: a failed generation yields the placeholder pair and a
	/// failed balance query yields a zero balance.
	#[instrument(skip_all)]
	pub async fn provision(&self) -> Wallet {
		let (address, private_key) = match self.gateway.create_account().await {
			Ok(keys) => (keys.address, keys.private_key),
			Err(e) => {
				tracing::warn!(error = %e, "Account generation failed, using placeholder wallet");
				(
					PLACEHOLDER_ADDRESS.to_string(),
					SecretKey::from(PLACEHOLDER_PRIVATE_KEY),
				)
			}
		};

		let balance = match self.gateway.get_balance(&address).await {
			Ok(balance) => format_base_units_fixed(balance),
			Err(e) => {
				tracing::warn!(address = %address, error = %e, "Balance query failed, reporting zero");
				UNKNOWN_BALANCE.to_string()
			}
		};

		tracing::info!(address = %address, balance = %balance, "Wallet provisioned");
		Wallet::new(address, private_key, balance)
	}

	/// Re-reads the balance of `address`, formatted to four decimals.
	pub async fn refresh_balance(&self, address: &str) -> Result<String, LifecycleError> {
		let balance = self.gateway.get_balance(address).await?;
		Ok(format_base_units_fixed(balance))
	}
}

/// Optimistic balance after a transfer: `max(0, balance - amount - fee)`,
/// fixed to four decimals.
///
/// An unreadable balance counts as zero.
pub fn estimate_balance_after_transfer(balance: &str, amount: Decimal, fee: Decimal) -> String {
	let current = parse_amount(balance).unwrap_or(Decimal::ZERO);
	let remaining = (current - amount - fee).max(Decimal::ZERO);
	format_balance(remaining)
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;
	use std::str::FromStr;
	use std::sync::Arc;
	use txflow_gateway::implementations::mock::{MockCall, MockGateway};

	#[tokio::test]
	async fn test_provision_fresh_wallet() {
		let mock = Arc::new(MockGateway::new());
		let provisioner = WalletProvisioner::new(GatewayService::new(mock.clone()));

		let wallet = provisioner.provision().await;

		assert!(txflow_types::is_valid_address(&wallet.address));
		assert_ne!(wallet.address, PLACEHOLDER_ADDRESS);
		assert_eq!(wallet.balance, "0.0000");
		assert_eq!(mock.calls(MockCall::CreateAccount).await, 1);
		assert_eq!(mock.calls(MockCall::Balance).await, 1);
	}

	#[tokio::test]
	async fn test_provision_falls_back_to_placeholder() {
		let mock = Arc::new(MockGateway::new());
		mock.fail_on(MockCall::CreateAccount, "entropy unavailable")
			.await;
		mock.set_balance(PLACEHOLDER_ADDRESS, U256::from(10u128.pow(18)))
			.await;
		let provisioner = WalletProvisioner::new(GatewayService::new(mock));

		let wallet = provisioner.provision().await;

		assert_eq!(wallet.address, PLACEHOLDER_ADDRESS);
		assert_eq!(wallet.private_key.reveal(), PLACEHOLDER_PRIVATE_KEY);
		assert_eq!(wallet.balance, "1.0000");
	}

	#[tokio::test]
	async fn test_provision_survives_balance_failure() {
		let mock = Arc::new(MockGateway::new());
		mock.fail_on(MockCall::Balance, "rpc down").await;
		let provisioner = WalletProvisioner::new(GatewayService::new(mock));

		let wallet = provisioner.provision().await;

		assert_ne!(wallet.address, PLACEHOLDER_ADDRESS);
		assert_eq!(wallet.balance, UNKNOWN_BALANCE);
	}

	#[tokio::test]
	async fn test_refresh_surfaces_errors() {
		let mock = Arc::new(MockGateway::new());
		mock.set_balance(PLACEHOLDER_ADDRESS, U256::from(1_234_500_000_000_000_000u128))
			.await;
		let provisioner = WalletProvisioner::new(GatewayService::new(mock.clone()));

		assert_eq!(
			provisioner
				.refresh_balance(PLACEHOLDER_ADDRESS)
				.await
				.unwrap(),
			"1.2345"
		);

		mock.fail_on(MockCall::Balance, "rpc down").await;
		assert!(provisioner
			.refresh_balance(PLACEHOLDER_ADDRESS)
			.await
			.is_err());
	}

	#[test]
	fn test_estimate_balance_after_transfer() {
		let fee = Decimal::from_str("0.002").unwrap();
		assert_eq!(
			estimate_balance_after_transfer("1.0000", Decimal::from_str("0.1").unwrap(), fee),
			"0.8980"
		);
		assert_eq!(
			estimate_balance_after_transfer("0.0500", Decimal::from_str("0.1").unwrap(), fee),
			"0.0000"
		);
		assert_eq!(
			estimate_balance_after_transfer("bogus", Decimal::ONE, fee),
			"0.0000"
		);
	}
}
