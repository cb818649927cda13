//! Stage descriptors and timeline progress.

use crate::panel::DisplayMode;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use txflow_types::Stage;

/// Wording for one visible lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
	pub stage: Stage,
	pub label: &'static str,
	pub beginner_label: &'static str,
	pub description: &'static str,
	pub beginner_description: &'static str,
	/// Everyday comparison shown to beginners.
	pub analogy: &'static str,
}

static DESCRIPTORS: Lazy<HashMap<Stage, StageDescriptor>> = Lazy::new(|| {
	[
		StageDescriptor {
			stage: Stage::Created,
			label: "Created",
			beginner_label: "📝 Writing Your Letter",
			description: "Transaction object created with recipient and amount",
			beginner_description: "You've written down who to send money to and how much",
			analogy: "Like writing a letter with the recipient's address and a check inside",
		},
		StageDescriptor {
			stage: Stage::Signed,
			label: "Signed",
			beginner_label: "🔒 Sealing the Envelope",
			description: "Transaction signed with your private key",
			beginner_description:
				"You've sealed it with your unique signature so no one can tamper with it",
			analogy: "Like signing a check and sealing the envelope - only you can do this",
		},
		StageDescriptor {
			stage: Stage::Broadcasted,
			label: "Broadcasted",
			beginner_label: "📮 Dropping in the Mailbox",
			description: "Transaction sent to the network",
			beginner_description: "Your transaction is sent out to the blockchain network",
			analogy: "Like dropping your letter in the mailbox - it's now in the postal system",
		},
		StageDescriptor {
			stage: Stage::Pending,
			label: "Pending in Mempool",
			beginner_label: "⏳ Waiting at the Post Office",
			description: "Waiting to be included in a block",
			beginner_description: "Your transaction is waiting in line with others to be processed",
			analogy: "Like your letter waiting at the post office to be sorted and delivered",
		},
		StageDescriptor {
			stage: Stage::Included,
			label: "Included in Block",
			beginner_label: "🚚 Out for Delivery",
			description: "Transaction added to a block by a miner",
			beginner_description:
				"Your transaction has been grouped with others and is being delivered",
			analogy: "Like your letter being loaded onto a delivery truck with other mail",
		},
		StageDescriptor {
			stage: Stage::Confirmed,
			label: "Confirmed",
			beginner_label: "🎉 Delivered Successfully",
			description: "Transaction finalized with receipt",
			beginner_description: "Your money has arrived and the transaction is complete!",
			analogy: "Like getting a delivery confirmation - the letter has been received",
		},
	]
	.into_iter()
	.map(|d| (d.stage, d))
	.collect()
});

/// Returns the descriptor of a visible stage, `None` for `idle` and `error`.
pub fn descriptor(stage: Stage) -> Option<&'static StageDescriptor> {
	DESCRIPTORS.get(&stage)
}

/// Where a stage sits relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
	Complete,
	Active,
	Upcoming,
}

/// One rendered entry of the stage timeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStep {
	pub stage: Stage,
	pub state: StepState,
	pub label: &'static str,
	pub description: &'static str,
	pub tooltip: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub analogy: Option<&'static str>,
}

/// Marks each visible stage as complete, active or upcoming.
///
/// In `idle` and `error` no stage is current, so every stage is upcoming.
pub fn stage_progress(current: Stage) -> Vec<(Stage, StepState)> {
	let position = current.position();
	Stage::VISIBLE
		.iter()
		.enumerate()
		.map(|(index, stage)| {
			let state = match position {
				Some(p) if index < p => StepState::Complete,
				Some(p) if index == p => StepState::Active,
				_ => StepState::Upcoming,
			};
			(*stage, state)
		})
		.collect()
}

/// Builds the timeline in the wording of `mode`.
///
/// Beginners get the analogy inline on the active stage and as the tooltip
/// everywhere; the technical view uses the description as tooltip.
pub fn timeline(current: Stage, mode: DisplayMode) -> Vec<StageStep> {
	stage_progress(current)
		.into_iter()
		.filter_map(|(stage, state)| {
			let d = descriptor(stage)?;
			Some(match mode {
				DisplayMode::Beginner => StageStep {
					stage,
					state,
					label: d.beginner_label,
					description: d.beginner_description,
					tooltip: d.analogy,
					analogy: (state == StepState::Active).then_some(d.analogy),
				},
				DisplayMode::Technical => StageStep {
					stage,
					state,
					label: d.label,
					description: d.description,
					tooltip: d.description,
					analogy: None,
				},
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_every_visible_stage_has_a_descriptor() {
		for stage in Stage::VISIBLE {
			assert_eq!(descriptor(stage).unwrap().stage, stage);
		}
		assert!(descriptor(Stage::Idle).is_none());
		assert!(descriptor(Stage::Error).is_none());
		assert_eq!(
			descriptor(Stage::Pending).unwrap().label,
			"Pending in Mempool"
		);
	}

	#[test]
	fn test_progress_mid_run() {
		let progress = stage_progress(Stage::Pending);
		let states: Vec<StepState> = progress.iter().map(|(_, s)| *s).collect();
		assert_eq!(
			states,
			vec![
				StepState::Complete,
				StepState::Complete,
				StepState::Complete,
				StepState::Active,
				StepState::Upcoming,
				StepState::Upcoming,
			]
		);
	}

	#[test]
	fn test_progress_without_current_stage() {
		for stage in [Stage::Idle, Stage::Error] {
			assert!(stage_progress(stage)
				.iter()
				.all(|(_, s)| *s == StepState::Upcoming));
		}
	}

	#[test]
	fn test_confirmed_is_active() {
		let progress = stage_progress(Stage::Confirmed);
		assert_eq!(progress[5], (Stage::Confirmed, StepState::Active));
		assert_eq!(progress[4].1, StepState::Complete);
	}

	#[test]
	fn test_timeline_wording() {
		let beginner = timeline(Stage::Signed, DisplayMode::Beginner);
		assert_eq!(beginner.len(), 6);
		assert_eq!(beginner[1].label, "🔒 Sealing the Envelope");
		assert_eq!(
			beginner[1].analogy,
			Some("Like signing a check and sealing the envelope - only you can do this")
		);
		assert!(beginner[0].analogy.is_none());

		let technical = timeline(Stage::Signed, DisplayMode::Technical);
		assert_eq!(technical[1].label, "Signed");
		assert_eq!(technical[1].tooltip, "Transaction signed with your private key");
		assert!(technical.iter().all(|s| s.analogy.is_none()));
	}
}
