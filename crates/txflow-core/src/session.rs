//! Session state and control gating.
//!
//! The session is the single owner of everything the page shows: the wallet,
//! the current stage, the accumulated transaction data and the error banner.
//! It also decides which controls are available, so a send or reset issued at
//! the wrong moment is rejected here rather than reaching the controller.

use thiserror::Error;
use txflow_types::{LifecycleEvent, Stage, TransactionData, Wallet};

/// Errors raised when a control is used while it is unavailable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
	#[error("No wallet has been generated yet")]
	NoWallet,
	#[error("A transfer is already in progress (stage: {0})")]
	TransferInProgress(Stage),
	#[error("Reset is only available after a transfer is confirmed or fails (stage: {0})")]
	ResetUnavailable(Stage),
	#[error("A balance refresh is already in progress")]
	RefreshInProgress,
	#[error("The faucet only funds wallets with a zero balance")]
	FaucetUnavailable,
	#[error("A faucet request is already in progress")]
	FaucetInProgress,
	#[error("Invalid stage transition from {from} to {to}")]
	InvalidTransition { from: Stage, to: Stage },
}

/// In-memory state of one user session.
#[derive(Debug, Clone, Default)]
pub struct Session {
	stage: Stage,
	data: TransactionData,
	wallet: Option<Wallet>,
	error_banner: Option<String>,
	last_faucet_hash: Option<String>,
	run_active: bool,
	refreshing: bool,
	faucet_pending: bool,
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn stage(&self) -> Stage {
		self.stage
	}

	pub fn data(&self) -> &TransactionData {
		&self.data
	}

	pub fn wallet(&self) -> Option<&Wallet> {
		self.wallet.as_ref()
	}

	pub fn error_banner(&self) -> Option<&str> {
		self.error_banner.as_deref()
	}

	pub fn last_faucet_hash(&self) -> Option<&str> {
		self.last_faucet_hash.as_deref()
	}

	pub fn is_run_active(&self) -> bool {
		self.run_active
	}

	pub fn is_refreshing(&self) -> bool {
		self.refreshing
	}

	pub fn is_faucet_pending(&self) -> bool {
		self.faucet_pending
	}

	/// Send is enabled with a wallet, in `idle` or `error`, and with no run active.
	pub fn can_send(&self) -> bool {
		self.wallet.is_some()
			&& matches!(self.stage, Stage::Idle | Stage::Error)
			&& !self.run_active
	}

	/// Reset is enabled only in terminal stages.
	pub fn can_reset(&self) -> bool {
		self.stage.is_terminal() && !self.run_active
	}

	pub fn can_refresh(&self) -> bool {
		self.wallet.is_some() && !self.refreshing
	}

	/// The faucet control is shown for an empty wallet with no request pending.
	pub fn faucet_visible(&self) -> bool {
		self.wallet
			.as_ref()
			.map(|w| w.has_zero_balance())
			.unwrap_or(false)
			&& !self.faucet_pending
	}

	/// Replaces the wallet. Rejected while a transfer is running.
	pub fn set_wallet(&mut self, wallet: Wallet) -> Result<(), SessionError> {
		if self.run_active {
			return Err(SessionError::TransferInProgress(self.stage));
		}
		self.wallet = Some(wallet);
		self.last_faucet_hash = None;
		Ok(())
	}

	pub fn set_balance(&mut self, balance: String) {
		if let Some(wallet) = self.wallet.as_mut() {
			wallet.balance = balance;
		}
	}

	/// Stores `balance` only if `address` is still the session wallet.
	fn set_balance_for(&mut self, address: &str, balance: String) -> bool {
		match self.wallet.as_mut() {
			Some(wallet) if wallet.address.eq_ignore_ascii_case(address) => {
				wallet.balance = balance;
				true
			}
			_ => false,
		}
	}

	/// Marks the start of a run. A send from `error` starts from cleared data.
	pub fn begin_send(&mut self) -> Result<&Wallet, SessionError> {
		if self.run_active || !matches!(self.stage, Stage::Idle | Stage::Error) {
			return Err(SessionError::TransferInProgress(self.stage));
		}
		if self.wallet.is_none() {
			return Err(SessionError::NoWallet);
		}
		if self.stage == Stage::Error {
			self.stage = Stage::Idle;
			self.data.clear();
		}
		self.error_banner = None;
		self.run_active = true;
		self.wallet.as_ref().ok_or(SessionError::NoWallet)
	}

	/// Applies one lifecycle event: moves the stage and merges the patch.
	pub fn apply(&mut self, event: LifecycleEvent) -> Result<(), SessionError> {
		if !self.stage.can_transition_to(event.stage) {
			return Err(SessionError::InvalidTransition {
				from: self.stage,
				to: event.stage,
			});
		}
		self.stage = event.stage;
		self.data.merge(event.data);
		if self.stage == Stage::Error {
			self.error_banner = self.data.error.clone();
		}
		Ok(())
	}

	/// Marks the end of a run, whatever its outcome.
	pub fn finish_run(&mut self) {
		self.run_active = false;
	}

	/// Returns to `idle` with empty data. Only allowed from a terminal stage.
	pub fn reset(&mut self) -> Result<(), SessionError> {
		if !self.can_reset() {
			return Err(SessionError::ResetUnavailable(self.stage));
		}
		self.stage = Stage::Idle;
		self.data.clear();
		self.error_banner = None;
		Ok(())
	}

	pub fn begin_refresh(&mut self) -> Result<&Wallet, SessionError> {
		if self.refreshing {
			return Err(SessionError::RefreshInProgress);
		}
		let wallet = self.wallet.as_ref().ok_or(SessionError::NoWallet)?;
		self.refreshing = true;
		Ok(wallet)
	}

	/// Ends a refresh of `address`, storing the balance when one was read.
	/// A balance read for a wallet that has since been replaced is dropped.
	pub fn finish_refresh(&mut self, address: &str, balance: Option<String>) {
		self.refreshing = false;
		if let Some(balance) = balance {
			self.set_balance_for(address, balance);
		}
	}

	pub fn begin_faucet(&mut self) -> Result<&Wallet, SessionError> {
		if self.faucet_pending {
			return Err(SessionError::FaucetInProgress);
		}
		let wallet = self.wallet.as_ref().ok_or(SessionError::NoWallet)?;
		if !wallet.has_zero_balance() {
			return Err(SessionError::FaucetUnavailable);
		}
		self.faucet_pending = true;
		Ok(wallet)
	}

	/// Ends a faucet request for `address`, recording its hash and the
	/// refreshed balance while `address` is still the session wallet.
	pub fn finish_faucet(
		&mut self,
		address: &str,
		hash: Option<String>,
		balance: Option<String>,
	) {
		self.faucet_pending = false;
		let current = self
			.wallet
			.as_ref()
			.is_some_and(|w| w.address.eq_ignore_ascii_case(address));
		if !current {
			return;
		}
		if hash.is_some() {
			self.last_faucet_hash = hash;
		}
		if let Some(balance) = balance {
			self.set_balance_for(address, balance);
		}
	}

	/// Shows a message in the error banner without changing the stage.
	pub fn show_error(&mut self, message: String) {
		self.error_banner = Some(message);
	}

	pub fn dismiss_error(&mut self) {
		self.error_banner = None;
	}
}
