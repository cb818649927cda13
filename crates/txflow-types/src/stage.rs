//! Lifecycle stage enumeration.
//!
//! A transfer moves through a fixed, forward-only sequence of stages. Exactly
//! one stage is current at any time. `Error` is absorbing and reachable from
//! every non-terminal stage; only an explicit reset leaves a terminal stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrete state in the transaction lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
	/// No transfer in progress.
	#[default]
	Idle,
	/// The local transaction object has been constructed.
	Created,
	/// Nonce and gas price resolved, transaction ready to be signed.
	Signed,
	/// The gateway accepted the signed transaction.
	Broadcasted,
	/// Waiting for the transaction to be included in a block.
	Pending,
	/// A receipt was observed, or observation timed out.
	Included,
	/// Final status recorded.
	Confirmed,
	/// The run failed and must be reset.
	Error,
}

impl Stage {
	/// Stages shown on the lifecycle timeline, in order.
	pub const VISIBLE: [Stage; 6] = [
		Stage::Created,
		Stage::Signed,
		Stage::Broadcasted,
		Stage::Pending,
		Stage::Included,
		Stage::Confirmed,
	];

	/// Returns the wire name of the stage.
	pub fn as_str(&self) -> &'static str {
		match self {
			Stage::Idle => "idle",
			Stage::Created => "created",
			Stage::Signed => "signed",
			Stage::Broadcasted => "broadcasted",
			Stage::Pending => "pending",
			Stage::Included => "included",
			Stage::Confirmed => "confirmed",
			Stage::Error => "error",
		}
	}

	/// Position on the timeline, `None` for `Idle` and `Error`.
	pub fn position(&self) -> Option<usize> {
		Self::VISIBLE.iter().position(|s| s == self)
	}

	/// Returns true for stages that can only be left through a reset.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Stage::Confirmed | Stage::Error)
	}

	/// Returns true while a lifecycle run is in flight.
	pub fn is_in_flight(&self) -> bool {
		matches!(
			self,
			Stage::Created | Stage::Signed | Stage::Broadcasted | Stage::Pending | Stage::Included
		)
	}

	/// Returns the stage that normally follows this one.
	pub fn next(&self) -> Option<Stage> {
		match self {
			Stage::Idle => Some(Stage::Created),
			Stage::Created => Some(Stage::Signed),
			Stage::Signed => Some(Stage::Broadcasted),
			Stage::Broadcasted => Some(Stage::Pending),
			Stage::Pending => Some(Stage::Included),
			Stage::Included => Some(Stage::Confirmed),
			Stage::Confirmed | Stage::Error => None,
		}
	}

	/// Checks whether moving from `self` to `to` is a legal lifecycle step.
	///
	/// Forward steps follow [`Stage::next`]; `Error` is reachable from any
	/// non-terminal stage (including `Idle`, where precondition failures after
	/// the run began land); a terminal stage only goes back to `Idle`.
	pub fn can_transition_to(&self, to: Stage) -> bool {
		if self.is_terminal() {
			return to == Stage::Idle;
		}
		if to == Stage::Error {
			return true;
		}
		self.next() == Some(to)
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_forward_sequence() {
		let mut stage = Stage::Idle;
		let mut seen = vec![];
		while let Some(next) = stage.next() {
			assert!(stage.can_transition_to(next));
			seen.push(next);
			stage = next;
		}
		assert_eq!(seen, Stage::VISIBLE.to_vec());
	}

	#[test]
	fn test_no_skipping_or_going_back() {
		assert!(!Stage::Created.can_transition_to(Stage::Broadcasted));
		assert!(!Stage::Pending.can_transition_to(Stage::Signed));
		assert!(!Stage::Included.can_transition_to(Stage::Idle));
	}

	#[test]
	fn test_error_reachable_from_non_terminal() {
		for stage in [Stage::Idle, Stage::Created, Stage::Signed, Stage::Pending] {
			assert!(stage.can_transition_to(Stage::Error));
		}
		assert!(!Stage::Confirmed.can_transition_to(Stage::Error));
	}

	#[test]
	fn test_terminal_only_resets() {
		assert!(Stage::Confirmed.can_transition_to(Stage::Idle));
		assert!(Stage::Error.can_transition_to(Stage::Idle));
		assert!(!Stage::Error.can_transition_to(Stage::Created));
	}

	#[test]
	fn test_serde_lowercase() {
		let json = serde_json::to_string(&Stage::Broadcasted).unwrap();
		assert_eq!(json, "\"broadcasted\"");
		let stage: Stage = serde_json::from_str("\"included\"").unwrap();
		assert_eq!(stage, Stage::Included);
	}
}
