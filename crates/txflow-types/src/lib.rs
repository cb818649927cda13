//! Common types module for the txflow lifecycle visualizer.
//!
//! This module defines the data model shared by every txflow crate: the
//! lifecycle stages, the accumulated transaction data, the session wallet and
//! the records exchanged with the chain gateway. Keeping them in one place
//! lets the gateway, the lifecycle controller and the presentation layer agree
//! on a single representation.

/// Lifecycle events emitted by the transaction lifecycle controller.
pub mod events;
/// Records exchanged with the chain gateway.
pub mod gateway;
/// Redacting wrapper for private key material.
pub mod secret_key;
/// Lifecycle stage enumeration and its transition rules.
pub mod stage;
/// Accumulated transaction data and execution status.
pub mod transaction;
/// Conversion between native display units and base units.
pub mod units;
/// Utility functions for formatting and validation.
pub mod utils;
/// Session wallet type.
pub mod wallet;

pub use events::LifecycleEvent;
pub use gateway::{AccountKeys, BlockInfo, BlockRef, ReceiptInfo, TransactionInfo, TransferRequest};
pub use secret_key::SecretKey;
pub use stage::Stage;
pub use transaction::{ExecutionStatus, LogRecord, TransactionData};
pub use units::{
	format_balance, format_base_units_fixed, from_base_units, parse_amount, to_base_units,
	UnitsError, NATIVE_DECIMALS,
};
pub use utils::{
	is_valid_address, is_valid_private_key, short_address, truncate_id, with_0x_prefix,
	without_0x_prefix, TRANSFER_GAS_LIMIT, ZERO_BLOCK_HASH,
};
pub use wallet::Wallet;
