//! Errors raised by the wallet, faucet and lifecycle components.
//!
//! Raw messages are kept for logs; [`LifecycleError::user_message`] maps them
//! to the short explanations shown in the error banner.

use thiserror::Error;
use txflow_gateway::GatewayError;

/// Errors that can occur while provisioning, funding or sending.
#[derive(Debug, Error)]
pub enum LifecycleError {
	/// The recipient is not `0x` followed by 40 hex characters.
	#[error("Invalid recipient address: {0}")]
	InvalidRecipient(String),
	/// The amount is not a positive decimal.
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	/// Amount plus the estimated fee exceeds the known balance.
	#[error("Insufficient balance: {required} needed including fees, {available} available")]
	InsufficientBalance { required: String, available: String },
	/// The private key does not belong to the claimed address.
	#[error("Account mismatch: key belongs to {derived}, not {claimed}")]
	AccountMismatch { claimed: String, derived: String },
	/// The faucet account cannot cover a disbursement.
	#[error("Faucet depleted: balance {balance} is below the disbursement of {required}")]
	FaucetDepleted { balance: String, required: String },
	/// The faucet only funds empty wallets.
	#[error("Wallet already funded with {0}")]
	WalletAlreadyFunded(String),
	/// A network or RPC failure.
	#[error(transparent)]
	Gateway(#[from] GatewayError),
}

impl LifecycleError {
	/// Message shown to the user for this error.
	pub fn user_message(&self) -> String {
		FailureCategory::friendly_message(&self.to_string())
	}

	/// Returns true for errors detected before any network call.
	pub fn is_validation(&self) -> bool {
		matches!(
			self,
			LifecycleError::InvalidRecipient(_) | LifecycleError::InvalidAmount(_)
		)
	}
}

/// Broad classes of failures recognised in raw error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
	InvalidKey,
	InsufficientFunds,
	AccountMismatch,
	InvalidRecipient,
	Other,
}

impl FailureCategory {
	/// Classifies a raw message by case-insensitive substring match.
	pub fn classify(raw: &str) -> Self {
		let lower = raw.to_lowercase();
		if lower.contains("invalid private key") || lower.contains("invalid key") {
			FailureCategory::InvalidKey
		} else if lower.contains("insufficient funds") {
			FailureCategory::InsufficientFunds
		} else if lower.contains("account mismatch") {
			FailureCategory::AccountMismatch
		} else if lower.contains("invalid recipient address") {
			FailureCategory::InvalidRecipient
		} else {
			FailureCategory::Other
		}
	}

	/// Friendly message for a category, `None` when the raw text should be shown.
	pub fn message(&self) -> Option<&'static str> {
		match self {
			FailureCategory::InvalidKey => {
				Some("Invalid private key format. Please generate a new wallet.")
			}
			FailureCategory::InsufficientFunds => Some(
				"Insufficient funds for transaction. Please use the faucet to get test tokens.",
			),
			FailureCategory::AccountMismatch => {
				Some("Private key doesn't match wallet address. Please generate a new wallet.")
			}
			FailureCategory::InvalidRecipient => Some("Invalid recipient address format."),
			FailureCategory::Other => None,
		}
	}

	/// Reclassified message, or `raw` unchanged when no category matches.
	pub fn friendly_message(raw: &str) -> String {
		Self::classify(raw)
			.message()
			.map(str::to_string)
			.unwrap_or_else(|| raw.to_string())
	}
}
