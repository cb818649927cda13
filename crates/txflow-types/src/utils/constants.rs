//! Network constants shared across the txflow crates.

/// A zero bytes32 value as a hex string with 0x prefix.
///
/// Used as the block hash of a transfer whose inclusion could not be observed
/// before the polling budget ran out.
pub const ZERO_BLOCK_HASH: &str =
	"0x0000000000000000000000000000000000000000000000000000000000000000";

/// Gas limit of a plain native-value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
