//! Lifecycle events.
//!
//! The lifecycle controller reports progress as a single ordered stream of
//! events. Each event names the stage being entered and carries the patch of
//! [`TransactionData`] fields learned at that stage.

use crate::{Stage, TransactionData};
use serde::{Deserialize, Serialize};

/// A `(stage, partial data)` transition emitted by the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
	pub stage: Stage,
	pub data: TransactionData,
}

impl LifecycleEvent {
	pub fn new(stage: Stage, data: TransactionData) -> Self {
		Self { stage, data }
	}

	/// Builds the terminal error event for a failed run.
	pub fn error(message: impl Into<String>) -> Self {
		Self {
			stage: Stage::Error,
			data: TransactionData {
				error: Some(message.into()),
				..Default::default()
			},
		}
	}
}
