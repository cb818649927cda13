//! Core module for the txflow lifecycle visualizer.
//!
//! This crate holds the wallet provisioner, the faucet dispenser and the
//! transaction lifecycle controller, plus the session that consumes their
//! results and the engine that coordinates them for one user.

pub mod engine;
pub mod error;
pub mod faucet;
pub mod lifecycle;
pub mod session;
pub mod wallet;

pub use engine::{EngineError, RunHandle, TxflowEngine};
pub use error::{FailureCategory, LifecycleError};
pub use faucet::{FaucetDispenser, FaucetReceipt};
pub use lifecycle::{
	ConfirmationOutcome, LifecycleController, TransferIntent, TransferOutcome, ValidatedTransfer,
};
pub use session::{Session, SessionError};
pub use wallet::{estimate_balance_after_transfer, WalletProvisioner};
