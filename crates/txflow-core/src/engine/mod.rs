//! Engine that ties the session to the wallet, faucet and lifecycle components.
//!
//! Each user action goes through the engine. Gating is checked against the
//! session first; long operations then run without holding the session lock.
//! A transfer runs in its own task, and its events are applied to the session
//! in order by a single consumer task.

use crate::error::LifecycleError;
use crate::faucet::{FaucetDispenser, FaucetReceipt};
use crate::lifecycle::{LifecycleController, TransferIntent, TransferOutcome};
use crate::session::{Session, SessionError};
use crate::wallet::{estimate_balance_after_transfer, WalletProvisioner};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use txflow_config::Config;
use txflow_gateway::{GatewayInterface, GatewayService};
use txflow_types::{truncate_id, LifecycleEvent, Wallet};

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error(transparent)]
	Session(#[from] SessionError),
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	#[error("No faucet account is configured")]
	FaucetNotConfigured,
	#[error("Transfer task failed: {0}")]
	Task(String),
}

/// Handle to a transfer running in the background.
pub struct RunHandle {
	handle: JoinHandle<Result<TransferOutcome, LifecycleError>>,
}

impl RunHandle {
	/// Waits for the run to finish and for its events to be applied.
	pub async fn wait(self) -> Result<TransferOutcome, EngineError> {
		let result = self
			.handle
			.await
			.map_err(|e| EngineError::Task(e.to_string()))?;
		Ok(result?)
	}
}

/// Orchestrates wallet provisioning, funding and transfers for one session.
#[derive(Clone)]
pub struct TxflowEngine {
	config: Arc<Config>,
	gateway: GatewayService,
	session: Arc<RwLock<Session>>,
	provisioner: Arc<WalletProvisioner>,
	faucet: Option<Arc<FaucetDispenser>>,
	controller: Arc<LifecycleController>,
}

impl TxflowEngine {
	pub fn new(config: Config, gateway: Arc<dyn GatewayInterface>) -> Self {
		let gateway = GatewayService::new(gateway);
		let provisioner = Arc::new(WalletProvisioner::new(gateway.clone()));
		let faucet = config.faucet.clone().map(|faucet| {
			Arc::new(FaucetDispenser::new(
				gateway.clone(),
				faucet,
				&config.lifecycle,
			))
		});
		let controller = Arc::new(LifecycleController::new(
			gateway.clone(),
			config.lifecycle.clone(),
		));

		Self {
			config: Arc::new(config),
			gateway,
			session: Arc::new(RwLock::new(Session::new())),
			provisioner,
			faucet,
			controller,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn gateway(&self) -> &GatewayService {
		&self.gateway
	}

	pub fn faucet_enabled(&self) -> bool {
		self.faucet.is_some()
	}

	/// Copy of the current session state.
	pub async fn session(&self) -> Session {
		self.session.read().await.clone()
	}

	/// Generates a new wallet and makes it the session wallet.
	pub async fn generate_wallet(&self) -> Result<Wallet, EngineError> {
		{
			let session = self.session.read().await;
			if session.is_run_active() {
				return Err(SessionError::TransferInProgress(session.stage()).into());
			}
		}

		let wallet = self.provisioner.provision().await;
		self.session.write().await.set_wallet(wallet.clone())?;
		Ok(wallet)
	}

	/// Re-reads the wallet balance from the network.
	pub async fn refresh_balance(&self) -> Result<String, EngineError> {
		let address = self.session.write().await.begin_refresh()?.address.clone();

		let result = self.provisioner.refresh_balance(&address).await;
		let mut session = self.session.write().await;
		match result {
			Ok(balance) => {
				session.finish_refresh(&address, Some(balance.clone()));
				Ok(balance)
			}
			Err(e) => {
				tracing::warn!(error = %e, "Balance refresh failed");
				session.finish_refresh(&address, None);
				Err(e.into())
			}
		}
	}

	/// Funds the session wallet from the faucet.
	pub async fn request_faucet(&self) -> Result<FaucetReceipt, EngineError> {
		let faucet = self
			.faucet
			.clone()
			.ok_or(EngineError::FaucetNotConfigured)?;
		let target = self.session.write().await.begin_faucet()?.clone();

		let result = faucet.dispense(&target).await;
		let mut session = self.session.write().await;
		match result {
			Ok(receipt) => {
				tracing::info!(
					tx_hash = %truncate_id(&receipt.hash),
					balance = ?receipt.balance,
					"Wallet funded"
				);
				session.finish_faucet(
					&target.address,
					Some(receipt.hash.clone()),
					receipt.balance.clone(),
				);
				Ok(receipt)
			}
			Err(e) => {
				tracing::warn!(error = %e, "Faucet request failed");
				session.finish_faucet(&target.address, None, None);
				session.show_error(e.user_message());
				Err(e.into())
			}
		}
	}

	/// Starts a transfer of `amount` to `recipient` from the session wallet.
	///
	/// Gating and local validation happen before this returns; the transfer
	/// itself runs in the background and reports through the session.
	pub async fn send(&self, recipient: &str, amount: &str) -> Result<RunHandle, EngineError> {
		let transfer = {
			let mut session = self.session.write().await;
			if !session.can_send() {
				return Err(match session.wallet() {
					None => SessionError::NoWallet,
					Some(_) => SessionError::TransferInProgress(session.stage()),
				}
				.into());
			}
			let wallet = session.wallet().ok_or(SessionError::NoWallet)?;
			let intent = TransferIntent {
				sender_address: wallet.address.clone(),
				sender_key: wallet.private_key.clone(),
				sender_balance: wallet.balance.clone(),
				recipient: recipient.to_string(),
				amount: amount.to_string(),
			};
			let transfer = match self.controller.validate(&intent) {
				Ok(transfer) => transfer,
				Err(e) => {
					session.show_error(e.user_message());
					return Err(e.into());
				}
			};
			session.begin_send()?;
			transfer
		};

		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let consumer = tokio::spawn(consume_events(self.session.clone(), events_rx));

		let controller = self.controller.clone();
		let session = self.session.clone();
		let fee = self.config.lifecycle.estimated_fee;
		let handle = tokio::spawn(async move {
			let result = controller.execute(transfer, &events_tx).await;
			drop(events_tx);
			if let Err(e) = consumer.await {
				tracing::error!(error = %e, "Lifecycle event consumer failed");
			}

			let mut session = session.write().await;
			if let Ok(outcome) = &result {
				if let Some(balance) = session.wallet().map(|w| w.balance.clone()) {
					session.set_balance(estimate_balance_after_transfer(
						&balance,
						outcome.amount,
						fee,
					));
				}
			}
			session.finish_run();
			result
		});

		Ok(RunHandle { handle })
	}

	/// Returns a terminal session to `idle`.
	pub async fn reset(&self) -> Result<(), EngineError> {
		self.session.write().await.reset()?;
		tracing::info!("Session reset");
		Ok(())
	}

	pub async fn dismiss_error(&self) {
		self.session.write().await.dismiss_error();
	}
}

/// Applies lifecycle events to the session in arrival order.
async fn consume_events(
	session: Arc<RwLock<Session>>,
	mut events: mpsc::UnboundedReceiver<LifecycleEvent>,
) {
	while let Some(event) = events.recv().await {
		let stage = event.stage;
		if let Err(e) = session.write().await.apply(event) {
			tracing::error!(stage = %stage, error = %e, "Dropped lifecycle event");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;
	use std::time::Duration;
	use txflow_gateway::implementations::mock::{MockCall, MockGateway, ReceiptScript};
	use txflow_types::{ExecutionStatus, Stage};

	const RECIPIENT: &str = "0xb7fcfe251ca336841d019a731fed59658d150909";

	fn engine_with(mock: MockGateway, config: Config) -> (TxflowEngine, Arc<MockGateway>) {
		let faucet = config.faucet.as_ref().map(|f| f.address.clone());
		let mock = match faucet {
			Some(address) => mock.with_balance(address.parse().unwrap(), U256::from(10u128.pow(19))),
			None => mock,
		};
		let mock = Arc::new(mock);
		(TxflowEngine::new(config, mock.clone()), mock)
	}

	async fn funded_engine(script: ReceiptScript) -> (TxflowEngine, Arc<MockGateway>) {
		let (engine, mock) =
			engine_with(MockGateway::new().with_receipts(script), Config::for_tests());
		engine.generate_wallet().await.unwrap();
		engine.request_faucet().await.unwrap();
		(engine, mock)
	}

	#[tokio::test]
	async fn test_full_session() {
		let (engine, _mock) = funded_engine(ReceiptScript::AfterPolls(1)).await;
		let session = engine.session().await;
		assert_eq!(session.wallet().unwrap().balance, "0.5000");
		assert!(session.last_faucet_hash().is_some());
		assert!(!session.faucet_visible());

		let outcome = engine.send(RECIPIENT, "0.1").await.unwrap().wait().await.unwrap();
		assert_eq!(outcome.status, ExecutionStatus::Success);

		let session = engine.session().await;
		assert_eq!(session.stage(), Stage::Confirmed);
		assert_eq!(session.data().hash.as_deref(), Some(outcome.hash.as_str()));
		assert_eq!(session.data().status, Some(ExecutionStatus::Success));
		assert_eq!(session.wallet().unwrap().balance, "0.3980");
		assert!(session.can_reset());
		assert!(!session.can_send());

		engine.reset().await.unwrap();
		let session = engine.session().await;
		assert_eq!(session.stage(), Stage::Idle);
		assert!(session.data().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn test_controls_locked_while_running() {
		let (engine, _mock) = funded_engine(ReceiptScript::Never).await;

		let run = engine.send(RECIPIENT, "0.1").await.unwrap();
		assert!(matches!(
			engine.send(RECIPIENT, "0.1").await,
			Err(EngineError::Session(SessionError::TransferInProgress(_)))
		));
		assert!(matches!(
			engine.reset().await,
			Err(EngineError::Session(SessionError::ResetUnavailable(_)))
		));
		assert!(matches!(
			engine.generate_wallet().await,
			Err(EngineError::Session(SessionError::TransferInProgress(_)))
		));

		let outcome = run.wait().await.unwrap();
		assert!(outcome.confirmation.is_assumed());
		let session = engine.session().await;
		assert_eq!(session.stage(), Stage::Confirmed);
		assert_eq!(session.data().block_number, Some(0));
		engine.reset().await.unwrap();
	}

	#[tokio::test]
	async fn test_validation_error_shows_banner_only() {
		let (engine, mock) = funded_engine(ReceiptScript::AfterPolls(1)).await;
		let calls_before = mock.total_calls().await;

		let result = engine.send("0x1234", "0.1").await;
		assert!(matches!(
			result,
			Err(EngineError::Lifecycle(LifecycleError::InvalidRecipient(_)))
		));

		let session = engine.session().await;
		assert_eq!(session.stage(), Stage::Idle);
		assert_eq!(
			session.error_banner(),
			Some("Invalid recipient address format.")
		);
		assert!(session.can_send());
		assert_eq!(mock.total_calls().await, calls_before);

		engine.dismiss_error().await;
		assert!(engine.session().await.error_banner().is_none());
	}

	#[tokio::test]
	async fn test_failed_run_then_resend() {
		let (engine, mock) = funded_engine(ReceiptScript::AfterPolls(1)).await;
		mock.fail_on(MockCall::Send, "insufficient funds for gas * price + value")
			.await;

		let result = engine.send(RECIPIENT, "0.1").await.unwrap().wait().await;
		assert!(result.is_err());
		let session = engine.session().await;
		assert_eq!(session.stage(), Stage::Error);
		assert_eq!(
			session.error_banner(),
			Some("Insufficient funds for transaction. Please use the faucet to get test tokens.")
		);
		assert_eq!(session.wallet().unwrap().balance, "0.5000");

		mock.clear_failure(MockCall::Send).await;
		let outcome = engine.send(RECIPIENT, "0.1").await.unwrap().wait().await;
		assert!(outcome.is_ok());
		let session = engine.session().await;
		assert_eq!(session.stage(), Stage::Confirmed);
		assert!(session.data().error.is_none());
	}

	#[tokio::test]
	async fn test_send_without_wallet() {
		let (engine, _mock) = engine_with(MockGateway::new(), Config::for_tests());
		assert!(matches!(
			engine.send(RECIPIENT, "0.1").await,
			Err(EngineError::Session(SessionError::NoWallet))
		));
	}

	#[tokio::test]
	async fn test_faucet_not_configured() {
		let mut config = Config::for_tests();
		config.faucet = None;
		let (engine, _mock) = engine_with(MockGateway::new(), config);
		engine.generate_wallet().await.unwrap();

		assert!(!engine.faucet_enabled());
		assert!(matches!(
			engine.request_faucet().await,
			Err(EngineError::FaucetNotConfigured)
		));
	}

	#[tokio::test]
	async fn test_refresh_balance() {
		let (engine, mock) = funded_engine(ReceiptScript::AfterPolls(1)).await;
		let address = engine.session().await.wallet().unwrap().address.clone();
		mock.set_balance(&address, U256::from(2u128 * 10u128.pow(18)))
			.await;

		assert_eq!(engine.refresh_balance().await.unwrap(), "2.0000");
		let session = engine.session().await;
		assert_eq!(session.wallet().unwrap().balance, "2.0000");
		assert!(session.can_refresh());
	}

	#[tokio::test(start_paused = true)]
	async fn test_faucet_result_skips_replaced_wallet() {
		let (engine, mock) = engine_with(
			MockGateway::new().with_receipts(ReceiptScript::Never),
			Config::for_tests(),
		);
		let first = engine.generate_wallet().await.unwrap();

		let faucet = tokio::spawn({
			let engine = engine.clone();
			async move { engine.request_faucet().await }
		});
		tokio::time::sleep(Duration::from_secs(2)).await;
		let second = engine.generate_wallet().await.unwrap();
		let receipt = faucet.await.unwrap().unwrap();

		assert_eq!(receipt.balance.as_deref(), Some("0.5000"));
		assert_eq!(mock.get_balance(&second.address).await.unwrap(), U256::ZERO);
		let session = engine.session().await;
		let wallet = session.wallet().unwrap();
		assert_eq!(wallet.address, second.address);
		assert_ne!(wallet.address, first.address);
		assert_eq!(wallet.balance, "0.0000");
		assert_eq!(session.last_faucet_hash(), None);
		assert!(session.faucet_visible());
	}

	#[tokio::test(start_paused = true)]
	async fn test_refresh_result_skips_replaced_wallet() {
		let (engine, mock) = engine_with(MockGateway::new(), Config::for_tests());
		let first = engine.generate_wallet().await.unwrap();
		mock.set_balance(&first.address, U256::from(2u128 * 10u128.pow(18)))
			.await;

		mock.set_latency(Duration::from_secs(5)).await;
		let refresh = tokio::spawn({
			let engine = engine.clone();
			async move { engine.refresh_balance().await }
		});
		tokio::time::sleep(Duration::from_secs(1)).await;
		mock.set_latency(Duration::ZERO).await;
		let second = engine.generate_wallet().await.unwrap();

		assert_eq!(refresh.await.unwrap().unwrap(), "2.0000");
		let session = engine.session().await;
		let wallet = session.wallet().unwrap();
		assert_eq!(wallet.address, second.address);
		assert_eq!(wallet.balance, "0.0000");
		assert!(session.can_refresh());
	}
}
