//! Utility functions for formatting and validation.
//!
//! This module provides helpers for hex string handling, input validation and
//! the serde adapters shared by the txflow types.

pub mod constants;
pub mod formatting;
pub mod u256_serde;
pub mod validation;

pub use constants::{TRANSFER_GAS_LIMIT, ZERO_BLOCK_HASH};
pub use formatting::{short_address, truncate_id, with_0x_prefix, without_0x_prefix};
pub use validation::{is_valid_address, is_valid_private_key};
