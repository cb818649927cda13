//! Data panel rendering.
//!
//! A single [`Presenter`] renders the accumulated [`TransactionData`] into
//! three tabs of labelled fields. Beginner mode swaps in plain-language labels
//! and tooltips and hides the fields that only make sense with some protocol
//! background. When the live overlay is enabled, fields that the network can
//! report directly carry the freshly fetched value next to the snapshot.

use crate::live::LiveData;
use crate::stages::{timeline, StageStep};
use alloy_primitives::U256;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use txflow_types::{from_base_units, ExecutionStatus, Stage, TransactionData};

/// Rendered in place of any value that is not known yet.
pub const MISSING: &str = "-";

/// Wording used for the panel and the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
	#[default]
	Beginner,
	Technical,
}

impl DisplayMode {
	pub fn is_beginner(&self) -> bool {
		matches!(self, DisplayMode::Beginner)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
	Transaction,
	Block,
	Receipt,
}

/// One labelled value in a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
	/// Stable identifier, independent of the display mode.
	pub key: &'static str,
	pub label: String,
	pub value: String,
	pub tooltip: String,
	/// Hashes and addresses are shown in a monospace font.
	pub mono: bool,
	/// Value read from the network by the live overlay.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub live: Option<String>,
}

impl FieldView {
	/// Returns true when the live value differs from the snapshot.
	pub fn is_live_update(&self) -> bool {
		self.live.as_ref().is_some_and(|live| *live != self.value)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
	pub kind: TabKind,
	pub title: &'static str,
	pub fields: Vec<FieldView>,
}

impl TabView {
	pub fn field(&self, key: &str) -> Option<&FieldView> {
		self.fields.iter().find(|f| f.key == key)
	}
}

/// Headline shown once a run has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
	pub title: String,
	pub message: String,
}

/// The complete data panel for one stage and mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
	pub mode: DisplayMode,
	pub title: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<&'static str>,
	pub timeline: Vec<StageStep>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub outcome: Option<Outcome>,
	pub tabs: Vec<TabView>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub live_error: Option<String>,
}

impl PanelView {
	pub fn tab(&self, kind: TabKind) -> Option<&TabView> {
		self.tabs.iter().find(|t| t.kind == kind)
	}

	/// Looks a field up across all tabs.
	pub fn field(&self, key: &str) -> Option<&FieldView> {
		self.tabs.iter().find_map(|t| t.field(key))
	}
}

/// Renders transaction data for display.
#[derive(Debug, Clone)]
pub struct Presenter {
	symbol: String,
	with_live_overlay: bool,
}

impl Presenter {
	pub fn new(symbol: impl Into<String>) -> Self {
		Self {
			symbol: symbol.into(),
			with_live_overlay: false,
		}
	}

	/// Enables or disables the live overlay.
	pub fn with_live_overlay(mut self, enabled: bool) -> Self {
		self.with_live_overlay = enabled;
		self
	}

	pub fn render(
		&self,
		stage: Stage,
		data: &TransactionData,
		mode: DisplayMode,
		live: Option<&LiveData>,
	) -> PanelView {
		let live = if self.with_live_overlay { live } else { None };
		let ctx = RenderContext {
			beginner: mode.is_beginner(),
			symbol: &self.symbol,
			data,
			live,
		};

		PanelView {
			mode,
			title: if ctx.beginner {
				"Transaction Details"
			} else {
				"Transaction Data"
			},
			subtitle: ctx
				.beginner
				.then_some("The important information about your transfer"),
			timeline: timeline(stage, mode),
			outcome: outcome(stage, data, mode),
			tabs: vec![ctx.transaction_tab(), ctx.block_tab(), ctx.receipt_tab()],
			live_error: live.and_then(|l| l.error.clone()),
		}
	}
}

/// Raw JSON view of the accumulated data, offered in technical mode.
pub fn raw_json(data: &TransactionData) -> Result<serde_json::Value, serde_json::Error> {
	serde_json::to_value(data)
}

/// Renders an execution status for display.
pub fn status_text(status: ExecutionStatus) -> &'static str {
	if status.is_success() {
		"✓ Success"
	} else {
		"✗ Failed"
	}
}

/// Formats a unix timestamp in UTC.
pub fn format_timestamp(timestamp: u64) -> String {
	i64::try_from(timestamp)
		.ok()
		.and_then(|secs| DateTime::from_timestamp(secs, 0))
		.map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
		.unwrap_or_else(|| MISSING.to_string())
}

fn outcome(stage: Stage, data: &TransactionData, mode: DisplayMode) -> Option<Outcome> {
	let (title, message) = match (stage, mode) {
		(Stage::Confirmed, DisplayMode::Beginner) => (
			"Success! Your money arrived!",
			"Your transaction is now permanent and can't be changed".to_string(),
		),
		(Stage::Confirmed, DisplayMode::Technical) => (
			"Transaction Confirmed",
			"Transaction has been finalized on the blockchain".to_string(),
		),
		(Stage::Error, DisplayMode::Beginner) => (
			"Oops! Something went wrong",
			"Don't worry! This happens sometimes. Try sending again.".to_string(),
		),
		(Stage::Error, DisplayMode::Technical) => (
			"Transaction Failed",
			data.error
				.clone()
				.unwrap_or_else(|| "An error occurred".to_string()),
		),
		_ => return None,
	};
	Some(Outcome {
		title: title.to_string(),
		message,
	})
}

struct RenderContext<'a> {
	beginner: bool,
	symbol: &'a str,
	data: &'a TransactionData,
	live: Option<&'a LiveData>,
}

impl RenderContext<'_> {
	fn pick(&self, beginner: &str, technical: &str) -> String {
		if self.beginner {
			beginner.to_string()
		} else {
			technical.to_string()
		}
	}

	fn native(&self, amount: &str) -> String {
		format!("{} {}", amount, self.symbol)
	}

	fn transaction_tab(&self) -> TabView {
		let data = self.data;
		let tx = self.live.and_then(|l| l.transaction.as_ref());

		let mut fields = vec![
			FieldView {
				key: "hash",
				label: self.pick("Transaction ID", "Hash"),
				value: or_missing(data.hash.clone()),
				tooltip: self.pick(
					"A unique ID for this transaction, like a tracking number",
					"Unique identifier for this transaction",
				),
				mono: true,
				live: tx.map(|t| t.hash.clone()),
			},
			FieldView {
				key: "from",
				label: self.pick("Sent From", "From"),
				value: or_missing(data.from.clone()),
				tooltip: self.pick(
					"Your wallet address (like your account number)",
					"Sender's address",
				),
				mono: true,
				live: tx.map(|t| t.from.clone()),
			},
			FieldView {
				key: "to",
				label: self.pick("Sent To", "To"),
				value: or_missing(data.to.clone()),
				tooltip: self.pick("The recipient's wallet address", "Recipient's address"),
				mono: true,
				live: tx.and_then(|t| t.to.clone()),
			},
			FieldView {
				key: "amount",
				label: "Amount".to_string(),
				value: or_missing(data.value.as_deref().map(|v| self.native(v))),
				tooltip: if self.beginner {
					"How much money you're sending".to_string()
				} else {
					format!("Amount of {} being transferred", self.symbol)
				},
				mono: false,
				live: tx.map(|t| self.native(&from_base_units(t.value))),
			},
		];

		if !self.beginner {
			fields.extend([
				FieldView {
					key: "nonce",
					label: "Nonce".to_string(),
					value: or_missing(data.nonce.map(|n| n.to_string())),
					tooltip: "Transaction count from sender's address. Prevents replay attacks."
						.to_string(),
					mono: false,
					live: tx.map(|t| t.nonce.to_string()),
				},
				FieldView {
					key: "gasPrice",
					label: "Gas Price".to_string(),
					value: or_missing(data.gas_price.as_deref().map(|p| self.native(p))),
					tooltip: "Price per unit of gas for this transaction".to_string(),
					mono: false,
					live: tx
						.and_then(|t| t.gas_price)
						.map(|p| self.native(&from_base_units(U256::from(p)))),
				},
				FieldView {
					key: "gasLimit",
					label: "Gas Limit".to_string(),
					value: or_missing(data.gas.clone()),
					tooltip: "Maximum gas units allowed for this transaction".to_string(),
					mono: false,
					live: tx.map(|t| t.gas_limit.to_string()),
				},
				FieldView {
					key: "currentGasPrice",
					label: "Current Gas Price".to_string(),
					value: or_missing(
						self.live
							.and_then(|l| l.gas_price.as_deref())
							.map(|p| self.native(p)),
					),
					tooltip: "Current gas price on the network".to_string(),
					mono: false,
					live: None,
				},
			]);
		}

		TabView {
			kind: TabKind::Transaction,
			title: if self.beginner {
				"Transfer"
			} else {
				"Transaction"
			},
			fields,
		}
	}

	fn block_tab(&self) -> TabView {
		let data = self.data;
		let receipt = self.live.and_then(|l| l.receipt.as_ref());
		let block = self.live.and_then(|l| l.block.as_ref());

		let mut fields = vec![
			FieldView {
				key: "blockNumber",
				label: self.pick("Package Number", "Block Number"),
				value: or_missing(data.block_number.map(|n| n.to_string())),
				tooltip: if self.beginner {
					format!(
						"Your transaction was grouped with others in package #{}",
						data.block_number
							.map(|n| n.to_string())
							.unwrap_or_else(|| "?".to_string())
					)
				} else {
					"The block that includes this transaction".to_string()
				},
				mono: false,
				live: receipt.map(|r| r.block_number.to_string()),
			},
			FieldView {
				key: "currentBlock",
				label: "Current Block".to_string(),
				value: or_missing(self.live.and_then(|l| l.block_number).map(|n| n.to_string())),
				tooltip: "Latest block number on the network".to_string(),
				mono: false,
				live: None,
			},
		];

		if !self.beginner {
			fields.extend([
				FieldView {
					key: "blockHash",
					label: "Block Hash".to_string(),
					value: or_missing(data.block_hash.clone()),
					tooltip: "Unique identifier of the block".to_string(),
					mono: true,
					live: receipt.map(|r| r.block_hash.clone()),
				},
				FieldView {
					key: "transactionIndex",
					label: "Transaction Index".to_string(),
					value: or_missing(receipt.and_then(|r| r.transaction_index).map(|i| i.to_string())),
					tooltip: "Position of this transaction within the block".to_string(),
					mono: false,
					live: None,
				},
				FieldView {
					key: "blockGasUsed",
					label: "Block Gas Used".to_string(),
					value: or_missing(block.map(|b| b.gas_used.to_string())),
					tooltip: "Total gas used by all transactions in this block".to_string(),
					mono: false,
					live: None,
				},
			]);
		}

		fields.push(FieldView {
			key: "timestamp",
			label: self.pick("When", "Timestamp"),
			value: or_missing(data.timestamp.map(format_timestamp)),
			tooltip: self.pick(
				"When your transaction was processed",
				"When the block was mined",
			),
			mono: false,
			live: block.map(|b| format_timestamp(b.timestamp)),
		});

		TabView {
			kind: TabKind::Block,
			title: if self.beginner { "Package" } else { "Block" },
			fields,
		}
	}

	fn receipt_tab(&self) -> TabView {
		let data = self.data;
		let receipt = self.live.and_then(|l| l.receipt.as_ref());

		let mut fields = vec![
			FieldView {
				key: "status",
				label: "Status".to_string(),
				value: or_missing(data.status.map(|s| status_text(s).to_string())),
				tooltip: self.pick(
					"Whether your money was successfully sent",
					"Whether the transaction executed successfully",
				),
				mono: false,
				live: receipt.map(|r| status_text(r.status).to_string()),
			},
			FieldView {
				key: "confirmations",
				label: "Confirmations".to_string(),
				value: or_missing(self.live.and_then(LiveData::confirmations).map(|c| c.to_string())),
				tooltip: "Number of blocks mined since this transaction".to_string(),
				mono: false,
				live: None,
			},
		];

		if !self.beginner {
			fields.extend([
				FieldView {
					key: "gasUsed",
					label: "Gas Used".to_string(),
					value: or_missing(data.gas_used.clone()),
					tooltip: "Actual amount of gas consumed by this transaction".to_string(),
					mono: false,
					live: receipt.map(|r| r.gas_used.to_string()),
				},
				FieldView {
					key: "effectiveGasPrice",
					label: "Effective Gas Price".to_string(),
					value: or_missing(receipt.map(|r| format!("{} Wei", r.effective_gas_price))),
					tooltip: "Actual gas price paid for this transaction".to_string(),
					mono: false,
					live: None,
				},
				FieldView {
					key: "cumulativeGasUsed",
					label: "Cumulative Gas Used".to_string(),
					value: or_missing(receipt.map(|r| r.cumulative_gas_used.to_string())),
					tooltip: "Total gas used by all transactions up to this point in the block"
						.to_string(),
					mono: false,
					live: None,
				},
				FieldView {
					key: "logs",
					label: "Logs".to_string(),
					value: or_missing(data.logs.as_ref().map(|l| format!("{} events", l.len()))),
					tooltip: "Events emitted during transaction execution".to_string(),
					mono: false,
					live: receipt.map(|r| format!("{} events", r.logs.len())),
				},
				FieldView {
					key: "contractAddress",
					label: "Contract Address".to_string(),
					value: or_missing(receipt.and_then(|r| r.contract_address.clone())),
					tooltip: "Address of contract created (if any)".to_string(),
					mono: true,
					live: None,
				},
			]);
		}

		TabView {
			kind: TabKind::Receipt,
			title: "Receipt",
			fields,
		}
	}
}

fn or_missing(value: Option<String>) -> String {
	value.unwrap_or_else(|| MISSING.to_string())
}
